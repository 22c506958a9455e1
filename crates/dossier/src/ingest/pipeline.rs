//! Single-repository sync.

use std::collections::HashSet;
use std::future::Future;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::prelude::{ProjectModel, ProjectReleaseModel, SemVer};
use crate::github::{FetchLimits, GitHubClient, RepoRef, short_error_message};
use crate::parsers::ParserRegistry;
use crate::store::{VersionRecord, metadata, projects, sections};

use super::docs::collect_repo_sections;
use super::error::Result;
use super::progress::{IngestProgress, ProgressCallback, emit};

/// Source tag stored on versions derived from releases.
pub const RELEASE_SOURCE: &str = "release";

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Project name; defaults to `owner/repo`.
    pub name: Option<String>,
    /// Overrides the repository description.
    pub description: Option<String>,
    /// Parse the docs folder in addition to the README.
    pub include_docs: bool,
    /// Log and skip extended-data failures instead of failing the sync.
    /// Rate-limit errors always fail.
    pub best_effort_metadata: bool,
    pub limits: FetchLimits,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            include_docs: true,
            best_effort_metadata: false,
            limits: FetchLimits::default(),
        }
    }
}

impl IngestOptions {
    /// Options used for each repository of a batch run: smaller caps and
    /// best-effort metadata.
    #[must_use]
    pub fn batch(include_docs: bool) -> Self {
        Self {
            include_docs,
            best_effort_metadata: true,
            limits: FetchLimits::batch(),
            ..Self::default()
        }
    }
}

/// Row counts written by [`sync_repository`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub project_id: Uuid,
    pub project: String,
    pub full_name: String,
    pub sections: usize,
    pub doc_files: usize,
    pub languages: usize,
    pub dependencies: usize,
    pub contributors: usize,
    pub issues: usize,
    pub branches: usize,
    pub pull_requests: usize,
    pub releases: usize,
    pub versions: usize,
    /// Metadata kinds skipped after a fetch error.
    pub skipped: Vec<&'static str>,
}

struct Step<'a> {
    repo: &'a RepoRef,
    full_name: &'a str,
    best_effort: bool,
    on_progress: Option<&'a ProgressCallback>,
}

impl Step<'_> {
    /// Run one metadata fetch. `Ok(None)` means the failure was tolerated.
    async fn fetch<T, Fut>(
        &self,
        kind: &'static str,
        skipped: &mut Vec<&'static str>,
        fut: Fut,
    ) -> Result<Option<T>>
    where
        Fut: Future<Output = crate::github::Result<T>>,
    {
        emit(
            self.on_progress,
            IngestProgress::FetchingMetadata {
                full_name: self.full_name.to_string(),
                kind,
            },
        );
        match fut.await {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.best_effort && !err.is_rate_limited() => {
                warn!(
                    owner = %self.repo.owner,
                    repo = %self.repo.name,
                    kind,
                    error = %err,
                    "skipping metadata"
                );
                emit(
                    self.on_progress,
                    IngestProgress::MetadataSkipped {
                        full_name: self.full_name.to_string(),
                        kind,
                        error: short_error_message(&err),
                    },
                );
                skipped.push(kind);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn count(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Fetch a repository and store it as a project with all its metadata.
pub async fn sync_repository(
    client: &GitHubClient,
    db: &DatabaseConnection,
    repo_ref: &RepoRef,
    options: &IngestOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<IngestSummary> {
    emit(
        on_progress,
        IngestProgress::FetchingRepo {
            full_name: repo_ref.full_name(),
        },
    );
    let repo = client.get_repo(repo_ref).await?;
    let full_name = repo.full_name.clone();

    let registry = ParserRegistry::default();
    let docs = collect_repo_sections(
        client,
        repo_ref,
        Some(&repo.default_branch),
        options.include_docs,
        &registry,
    )
    .await?;
    emit(
        on_progress,
        IngestProgress::DocsCollected {
            full_name: full_name.clone(),
            sections: docs.sections.len(),
            files: docs.files,
        },
    );

    let name = options.name.clone().unwrap_or_else(|| full_name.clone());
    let project = projects::upsert_synced(db, &name, &repo, options.description.clone()).await?;
    let stored = sections::replace_for_project(db, project.id, &docs.sections).await?;

    let mut summary = IngestSummary {
        project_id: project.id,
        project: project.name.clone(),
        full_name: full_name.clone(),
        sections: count(stored),
        doc_files: docs.files,
        ..IngestSummary::default()
    };

    let step = Step {
        repo: repo_ref,
        full_name: &full_name,
        best_effort: options.best_effort_metadata,
        on_progress,
    };
    let limits = &options.limits;
    let mut skipped = Vec::new();

    if let Some(rows) = step
        .fetch("languages", &mut skipped, client.list_languages(repo_ref))
        .await?
    {
        summary.languages = count(metadata::replace_languages(db, project.id, &rows).await?);
    }
    if let Some(rows) = step
        .fetch("dependencies", &mut skipped, client.list_dependencies(repo_ref))
        .await?
    {
        summary.dependencies = count(metadata::replace_dependencies(db, project.id, &rows).await?);
    }
    if let Some(rows) = step
        .fetch(
            "contributors",
            &mut skipped,
            client.list_contributors(repo_ref, limits),
        )
        .await?
    {
        summary.contributors = count(metadata::replace_contributors(db, project.id, &rows).await?);
    }
    if let Some(rows) = step
        .fetch("issues", &mut skipped, client.list_issues(repo_ref, limits))
        .await?
    {
        summary.issues = count(metadata::replace_issues(db, project.id, &rows).await?);
    }
    if let Some(rows) = step
        .fetch(
            "branches",
            &mut skipped,
            client.list_branches(repo_ref, limits, Some(&repo.default_branch)),
        )
        .await?
    {
        summary.branches = count(metadata::replace_branches(db, project.id, &rows).await?);
    }
    if let Some(rows) = step
        .fetch(
            "pull_requests",
            &mut skipped,
            client.list_pull_requests(repo_ref, limits),
        )
        .await?
    {
        summary.pull_requests =
            count(metadata::replace_pull_requests(db, project.id, &rows).await?);
    }
    if let Some(rows) = step
        .fetch("releases", &mut skipped, client.list_releases(repo_ref, limits))
        .await?
    {
        let releases = metadata::replace_releases(db, project.id, &rows).await?;
        summary.releases = releases.len();
        let versions = derive_versions(&project, &releases);
        summary.versions = count(metadata::replace_versions(db, project.id, &versions).await?);
    }
    summary.skipped = skipped;

    info!(
        owner = %repo_ref.owner,
        repo = %repo_ref.name,
        project = %summary.project,
        sections = summary.sections,
        releases = summary.releases,
        "repository synced"
    );
    emit(
        on_progress,
        IngestProgress::RepoSynced {
            full_name,
            project: summary.project.clone(),
            sections: summary.sections,
        },
    );
    Ok(summary)
}

/// Turn stored releases into version rows.
///
/// Tags are deduplicated on their version string (leading `v` dropped).
/// The newest non-draft, non-prerelease release by publish date is marked
/// latest; releases without a publish date never win. Each version links to
/// the changes since the next lower version.
#[must_use]
pub fn derive_versions(project: &ProjectModel, releases: &[ProjectReleaseModel]) -> Vec<VersionRecord> {
    let latest = releases
        .iter()
        .filter(|r| !r.is_draft && !r.is_prerelease)
        .filter_map(|r| r.release_published_at.map(|at| (at, r.id)))
        .max_by_key(|(at, _)| *at)
        .map(|(_, id)| id);

    let mut seen = HashSet::new();
    let mut records: Vec<(&str, VersionRecord)> = releases
        .iter()
        .filter_map(|r| {
            let version = r.tag_name.trim().trim_start_matches(['v', 'V']).to_string();
            if version.is_empty() || !seen.insert(version.clone()) {
                return None;
            }
            let record = VersionRecord {
                semver: SemVer::parse(&r.tag_name),
                version,
                source: RELEASE_SOURCE.to_string(),
                release_id: Some(r.id),
                is_latest: latest == Some(r.id),
                release_url: r
                    .html_url
                    .clone()
                    .or_else(|| project.releases_url(Some(&r.tag_name))),
                changelog_url: None,
                release_date: r
                    .release_published_at
                    .or(r.release_created_at)
                    .map(|at| at.to_utc()),
            };
            Some((r.tag_name.as_str(), record))
        })
        .collect();

    let mut ascending: Vec<usize> = (0..records.len()).collect();
    ascending.sort_by(|&a, &b| records[a].1.semver.cmp(&records[b].1.semver));
    for pair in ascending.windows(2) {
        let (from, to) = (records[pair[0]].0, records[pair[1]].0);
        records[pair[1]].1.changelog_url = project.compare_url(from, to);
    }

    records.into_iter().map(|(_, record)| record).collect()
}
