use std::sync::Arc;

use dossier::github::{GitHubClient, GitHubRepo, RepoRef};
use dossier::ingest::batch::CancelCheck;
use dossier::ingest::{
    BatchOptions, BatchSummary, IngestOptions, IngestSummary, RepoFilter, RepoSource, sync_many,
    sync_repository,
};
use tabled::Tabled;

use crate::commands::limits::handle_limits;
use crate::commands::shared::{
    display_errors, display_final_rate_limit, github_client, is_tty, open_db, or_dash,
    print_table, truncate,
};
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::shutdown::{is_shutdown_requested, setup_shutdown_handler};
use crate::{BatchSyncOptions, GithubAction};

const DESCRIPTION_WIDTH: usize = 60;

#[derive(Debug, Tabled)]
struct SearchRow {
    #[tabled(rename = "Repository")]
    full_name: String,
    #[tabled(rename = "Stars")]
    stars: u64,
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&GitHubRepo> for SearchRow {
    fn from(repo: &GitHubRepo) -> Self {
        Self {
            full_name: repo.full_name.clone(),
            stars: repo.stars,
            language: or_dash(repo.language.as_deref()),
            description: truncate(repo.description.as_deref().unwrap_or(""), DESCRIPTION_WIDTH),
        }
    }
}

/// Batch options from flags, with config supplying the defaults.
pub(crate) fn batch_options(owner: &str, options: BatchSyncOptions, config: &Config) -> BatchOptions {
    BatchOptions {
        filter: RepoFilter {
            skip_forks: options.skip_forks,
            language: options.language,
            limit: Some(options.limit).filter(|l| *l > 0),
        },
        parent: Some(options.parent.unwrap_or_else(|| owner.to_string())),
        include_docs: !options.no_docs && config.sync.include_docs,
        batch_size: options.batch_size.unwrap_or(config.sync.batch_size),
        batch_delay: config.batch_delay(),
        force: options.force,
    }
}

fn summary_lines(summary: &IngestSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "✓ Synced {} as '{}'",
        summary.full_name, summary.project
    )];
    lines.push(format!(
        "  {} sections ({} doc files)",
        summary.sections, summary.doc_files
    ));
    let counts = [
        ("languages", summary.languages),
        ("dependencies", summary.dependencies),
        ("contributors", summary.contributors),
        ("issues", summary.issues),
        ("pull requests", summary.pull_requests),
        ("releases", summary.releases),
        ("branches", summary.branches),
        ("versions", summary.versions),
    ];
    let stored: Vec<String> = counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(label, n)| format!("{n} {label}"))
        .collect();
    if !stored.is_empty() {
        lines.push(format!("  {}", stored.join(", ")));
    }
    if !summary.skipped.is_empty() {
        lines.push(format!("  skipped: {}", summary.skipped.join(", ")));
    }
    lines
}

fn print_batch_summary(owner: &str, summary: &BatchSummary, tty: bool) {
    if tty {
        println!();
        println!("{owner}: {} of {} repositories matched", summary.matched, summary.listed);
        println!("  Synced:  {}", summary.synced);
        println!("  Skipped: {} (synced within the last hour)", summary.skipped);
        println!("  Failed:  {}", summary.failed);
        if summary.rate_limited {
            println!("  Stopped early: rate limit reached. Run again after the reset to resume.");
        }
        if summary.cancelled {
            println!("  Cancelled before finishing.");
        }
    } else {
        tracing::info!(
            owner,
            listed = summary.listed,
            matched = summary.matched,
            synced = summary.synced,
            skipped = summary.skipped,
            failed = summary.failed,
            rate_limited = summary.rate_limited,
            cancelled = summary.cancelled,
            "Batch sync finished"
        );
    }
    display_errors(&summary.errors, tty);
}

async fn run_batch(
    source: RepoSource,
    options: BatchSyncOptions,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = source.owner().to_string();
    let batch = batch_options(&owner, options, config);
    let tty = is_tty();

    let db = open_db(database_url).await?;
    let reporter = Arc::new(ProgressReporter::new());
    let client = github_client(config, Some(&reporter))?;
    let on_progress = reporter.as_callback();

    setup_shutdown_handler();
    let cancel: &CancelCheck = &is_shutdown_requested;

    if tty {
        println!("Syncing repositories for '{owner}'...\n");
    }
    let summary = sync_many(&client, &db, &source, &batch, Some(cancel), Some(&on_progress)).await;
    reporter.finish();
    let summary = summary?;

    print_batch_summary(&owner, &summary, tty);
    display_final_rate_limit(&client, tty).await;
    Ok(())
}

async fn print_info(client: &GitHubClient, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let repo_ref = RepoRef::parse(url)?;
    let repo = client.get_repo(&repo_ref).await?;
    let has_readme = client.get_readme(&repo_ref).await?.is_some();
    let docs = client
        .list_docs_files(&repo_ref, Some(&repo.default_branch))
        .await?;

    println!("{}", repo.full_name);
    if let Some(description) = &repo.description {
        println!("  {description}");
    }
    println!();
    println!("  URL:            {}", repo.html_url);
    println!("  Default branch: {}", repo.default_branch);
    println!("  Language:       {}", or_dash(repo.language.as_deref()));
    println!("  Stars:          {}", repo.stars);
    if repo.is_fork {
        println!("  Fork:           yes");
    }
    if !repo.topics.is_empty() {
        println!("  Topics:         {}", repo.topics.join(", "));
    }
    println!("  README:         {}", if has_readme { "yes" } else { "no" });
    println!("  Doc files:      {}", docs.len());
    for file in &docs {
        println!("    {}", file.path);
    }
    Ok(())
}

pub(crate) async fn handle_github(
    action: GithubAction,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        GithubAction::Sync {
            url,
            name,
            description,
            no_docs,
        } => {
            let repo_ref = RepoRef::parse(&url)?;
            let db = open_db(database_url).await?;
            let reporter = Arc::new(ProgressReporter::new());
            let client = github_client(config, Some(&reporter))?;
            let on_progress = reporter.as_callback();

            let options = IngestOptions {
                name,
                description,
                include_docs: !no_docs && config.sync.include_docs,
                best_effort_metadata: true,
                ..IngestOptions::default()
            };
            let summary =
                sync_repository(&client, &db, &repo_ref, &options, Some(&on_progress)).await;
            reporter.finish();
            let summary = summary?;

            if is_tty() {
                for line in summary_lines(&summary) {
                    println!("{line}");
                }
            } else {
                tracing::info!(
                    repo = %summary.full_name,
                    project = %summary.project,
                    sections = summary.sections,
                    skipped = ?summary.skipped,
                    "Sync complete"
                );
            }
        }
        GithubAction::Search { query, limit, sort } => {
            let client = github_client(config, None)?;
            let results = client.search_repos(&query, &sort, limit).await?;
            if results.repos.is_empty() {
                println!("No repositories found for '{query}'.");
                return Ok(());
            }
            print_table(results.repos.iter().map(SearchRow::from));
            println!(
                "Showing {} of {} results",
                results.repos.len(),
                results.total_count
            );
        }
        GithubAction::Info { url } => {
            let client = github_client(config, None)?;
            print_info(&client, &url).await?;
        }
        GithubAction::SyncUser { user, options } => {
            run_batch(RepoSource::User(user), options, config, database_url).await?;
        }
        GithubAction::SyncOrg { org, options } => {
            run_batch(RepoSource::Org(org), options, config, database_url).await?;
        }
        GithubAction::Limits { output } => {
            let client = github_client(config, None)?;
            handle_limits(&client, output).await?;
        }
    }

    Ok(())
}
