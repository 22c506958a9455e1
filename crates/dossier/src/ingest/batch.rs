//! Batch sync of every repository owned by a user or organization.

use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entity::prelude::{ProjectModel, RelationshipType};
use crate::github::{GitHubClient, GitHubError, GitHubRepo, RepoRef};
use crate::store::{NewProject, StoreError, components, projects};

use super::error::{IngestError, Result};
use super::pipeline::{IngestOptions, sync_repository};
use super::progress::{IngestProgress, ProgressCallback, emit};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(2);
/// Repositories synced more recently than this are skipped unless forced.
pub const RESYNC_AFTER: chrono::Duration = chrono::Duration::hours(1);
/// Below this many remaining requests, batches wait for the quota window.
pub const LOW_QUOTA: u32 = 20;
/// Longest quota pause between batches.
pub const MAX_QUOTA_PAUSE: Duration = Duration::from_secs(60);

/// Checked between repositories; `true` stops the run.
pub type CancelCheck = dyn Fn() -> bool + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    User(String),
    Org(String),
}

impl RepoSource {
    #[must_use]
    pub fn owner(&self) -> &str {
        match self {
            Self::User(name) | Self::Org(name) => name,
        }
    }

    async fn list(&self, client: &GitHubClient) -> crate::github::Result<Vec<GitHubRepo>> {
        match self {
            Self::User(name) => client.list_user_repos(name).await,
            Self::Org(name) => client.list_org_repos(name).await,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoFilter {
    pub skip_forks: bool,
    /// Case-insensitive match on the primary language.
    pub language: Option<String>,
    pub limit: Option<usize>,
}

impl RepoFilter {
    #[must_use]
    pub fn apply(&self, repos: Vec<GitHubRepo>) -> Vec<GitHubRepo> {
        let matched = repos
            .into_iter()
            .filter(|r| !(self.skip_forks && r.is_fork))
            .filter(|r| match &self.language {
                Some(wanted) => r
                    .language
                    .as_deref()
                    .is_some_and(|lang| lang.eq_ignore_ascii_case(wanted)),
                None => true,
            });
        match self.limit {
            Some(limit) if limit > 0 => matched.take(limit).collect(),
            _ => matched.collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub filter: RepoFilter,
    /// Project that synced repositories are linked under; created when
    /// missing.
    pub parent: Option<String>,
    pub include_docs: bool,
    pub batch_size: usize,
    pub batch_delay: Duration,
    /// Re-sync repositories even when they were synced recently.
    pub force: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            filter: RepoFilter::default(),
            parent: None,
            include_docs: true,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            force: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Repositories listed before filtering.
    pub listed: usize,
    /// Repositories left after filtering.
    pub matched: usize,
    pub synced: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Stopped early on an exhausted quota. Running again resumes, since
    /// recently synced repositories are skipped.
    pub rate_limited: bool,
    pub cancelled: bool,
    /// `(full_name, error)` for each failure.
    pub errors: Vec<(String, String)>,
}

fn recently_synced(project: &ProjectModel) -> bool {
    project
        .last_synced_at
        .is_some_and(|at| Utc::now().fixed_offset() - at < RESYNC_AFTER)
}

async fn resolve_parent(
    db: &DatabaseConnection,
    name: &str,
    owner: &str,
) -> std::result::Result<ProjectModel, StoreError> {
    if let Some(existing) = projects::find_by_name(db, name).await? {
        return Ok(existing);
    }
    info!(project = name, owner, "creating parent project");
    projects::create(
        db,
        NewProject {
            description: Some(format!("GitHub repositories for {owner}")),
            ..NewProject::named(name)
        },
    )
    .await
}

async fn link_child(
    db: &DatabaseConnection,
    parent: &ProjectModel,
    child_name: &str,
    order: i32,
) -> std::result::Result<(), StoreError> {
    let child = projects::get_by_name(db, child_name).await?;
    match components::add(db, parent, &child, RelationshipType::Component, order).await {
        Ok(_) => Ok(()),
        Err(StoreError::ComponentExists { .. } | StoreError::SelfReference { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

/// How long to wait before the next batch.
fn pause_before_next_batch(client: &GitHubClient, batch_delay: Duration) -> (Duration, u32) {
    let quota = client.rate_limit();
    if quota.remaining < LOW_QUOTA {
        let wait = Duration::from_secs(quota.seconds_until_reset(Utc::now())).min(MAX_QUOTA_PAUSE);
        (wait, quota.remaining)
    } else {
        (batch_delay, quota.remaining)
    }
}

/// Sync every repository of `source` that passes the filter.
///
/// Failures are counted and the run continues; an exhausted quota stops it
/// with `rate_limited` set. `is_cancelled` is polled before each repository.
pub async fn sync_many(
    client: &GitHubClient,
    db: &DatabaseConnection,
    source: &RepoSource,
    options: &BatchOptions,
    is_cancelled: Option<&CancelCheck>,
    on_progress: Option<&ProgressCallback>,
) -> Result<BatchSummary> {
    let owner = source.owner();
    let parent = match &options.parent {
        Some(name) => Some(resolve_parent(db, name, owner).await?),
        None => None,
    };

    emit(
        on_progress,
        IngestProgress::ListingRepos {
            owner: owner.to_string(),
        },
    );
    let listed = source.list(client).await?;
    let mut summary = BatchSummary {
        listed: listed.len(),
        ..BatchSummary::default()
    };
    let repos = options.filter.apply(listed);
    summary.matched = repos.len();
    emit(
        on_progress,
        IngestProgress::ReposListed {
            owner: owner.to_string(),
            total: summary.listed,
            matched: summary.matched,
        },
    );

    match client.check_rate_limit().await {
        Ok(quota) if quota.remaining < 10 => {
            warn!(remaining = quota.remaining, limit = quota.limit, "low rate limit");
        }
        Ok(quota) => debug!(remaining = quota.remaining, limit = quota.limit, "rate limit"),
        Err(e) => debug!(error = %e, "rate limit check failed"),
    }

    let ingest = IngestOptions::batch(options.include_docs);
    let batch_size = options.batch_size.max(1);
    let total = repos.len();
    let batches = total.div_ceil(batch_size);

    'batches: for (batch_index, batch) in repos.chunks(batch_size).enumerate() {
        emit(
            on_progress,
            IngestProgress::BatchStarted {
                batch: batch_index + 1,
                batches,
                size: batch.len(),
            },
        );

        for (offset, repo) in batch.iter().enumerate() {
            let position = batch_index * batch_size + offset + 1;

            if is_cancelled.is_some_and(|check| check()) {
                summary.cancelled = true;
                emit(on_progress, IngestProgress::Cancelled);
                break 'batches;
            }

            if !options.force
                && let Some(existing) = projects::find_by_name(db, &repo.full_name).await?
                && recently_synced(&existing)
            {
                summary.skipped += 1;
                emit(
                    on_progress,
                    IngestProgress::RepoSkipped {
                        full_name: repo.full_name.clone(),
                        position,
                        total,
                    },
                );
                continue;
            }

            emit(
                on_progress,
                IngestProgress::RepoStarted {
                    full_name: repo.full_name.clone(),
                    position,
                    total,
                },
            );

            let repo_ref = RepoRef::new(&repo.owner, &repo.name);
            let outcome = match sync_repository(client, db, &repo_ref, &ingest, on_progress).await {
                Ok(synced) => match &parent {
                    Some(parent) => {
                        let order = i32::try_from(position).unwrap_or(i32::MAX);
                        link_child(db, parent, &synced.project, order)
                            .await
                            .map_err(IngestError::from)
                    }
                    None => Ok(()),
                },
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => summary.synced += 1,
                Err(IngestError::GitHub(GitHubError::RateLimited { wait_secs, .. })) => {
                    warn!(owner = %repo.owner, repo = %repo.name, wait_secs, "rate limited, stopping batch");
                    summary.rate_limited = true;
                    emit(
                        on_progress,
                        IngestProgress::RateLimited {
                            full_name: repo.full_name.clone(),
                            wait_secs,
                        },
                    );
                    break 'batches;
                }
                Err(e) => {
                    warn!(owner = %repo.owner, repo = %repo.name, error = %e, "repository sync failed");
                    summary.failed += 1;
                    emit(
                        on_progress,
                        IngestProgress::RepoFailed {
                            full_name: repo.full_name.clone(),
                            error: e.to_string(),
                        },
                    );
                    summary.errors.push((repo.full_name.clone(), e.to_string()));
                }
            }
        }

        if batch_index + 1 < batches {
            let (wait, remaining) = pause_before_next_batch(client, options.batch_delay);
            if !wait.is_zero() {
                emit(
                    on_progress,
                    IngestProgress::Pausing {
                        secs: wait.as_secs(),
                        remaining,
                    },
                );
                tokio::time::sleep(wait).await;
            }
        }
    }

    info!(
        owner,
        synced = summary.synced,
        failed = summary.failed,
        skipped = summary.skipped,
        rate_limited = summary.rate_limited,
        "batch sync finished"
    );
    emit(
        on_progress,
        IngestProgress::BatchComplete {
            synced: summary.synced,
            failed: summary.failed,
            skipped: summary.skipped,
            rate_limited: summary.rate_limited,
        },
    );
    Ok(summary)
}
