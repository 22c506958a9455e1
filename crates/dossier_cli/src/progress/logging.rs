use dossier::github::ClientEvent;
use dossier::ingest::IngestProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: IngestProgress) {
        match event {
            IngestProgress::FetchingRepo { full_name } => {
                tracing::info!(repo = %full_name, "Fetching repository");
            }

            IngestProgress::DocsCollected {
                full_name,
                sections,
                files,
            } => {
                tracing::info!(repo = %full_name, sections, files, "Parsed documentation");
            }

            IngestProgress::FetchingMetadata { full_name, kind } => {
                tracing::debug!(repo = %full_name, kind, "Fetching metadata");
            }

            IngestProgress::MetadataSkipped {
                full_name,
                kind,
                error,
            } => {
                tracing::warn!(repo = %full_name, kind, error = %error, "Skipped metadata");
            }

            IngestProgress::RepoSynced {
                full_name,
                project,
                sections,
            } => {
                tracing::info!(repo = %full_name, project = %project, sections, "Synced");
            }

            IngestProgress::ListingRepos { owner } => {
                tracing::info!(owner = %owner, "Listing repositories");
            }

            IngestProgress::ReposListed {
                owner,
                total,
                matched,
            } => {
                tracing::info!(owner = %owner, total, matched, "Listed repositories");
            }

            IngestProgress::BatchStarted {
                batch,
                batches,
                size,
            } => {
                tracing::info!(batch, batches, size, "Starting batch");
            }

            IngestProgress::RepoSkipped {
                full_name,
                position,
                total,
            } => {
                tracing::debug!(repo = %full_name, position, total, "Recently synced, skipping");
            }

            IngestProgress::RepoStarted {
                full_name,
                position,
                total,
            } => {
                tracing::info!(repo = %full_name, position, total, "Syncing");
            }

            IngestProgress::RepoFailed { full_name, error } => {
                tracing::error!(repo = %full_name, error = %error, "Sync failed");
            }

            IngestProgress::RateLimited {
                full_name,
                wait_secs,
            } => {
                tracing::warn!(repo = %full_name, wait_secs, "Rate limit reached, stopping");
            }

            IngestProgress::Pausing { secs, remaining } => {
                tracing::debug!(secs, remaining, "Pausing between batches");
            }

            IngestProgress::Cancelled => {
                tracing::warn!("Batch cancelled");
            }

            IngestProgress::BatchComplete {
                synced,
                failed,
                skipped,
                rate_limited,
            } => {
                tracing::info!(synced, failed, skipped, rate_limited, "Batch complete");
            }
        }
    }

    pub fn handle_client(&self, event: ClientEvent) {
        match event {
            ClientEvent::RetryScheduled {
                path,
                attempt,
                delay,
                reason,
            } => {
                tracing::warn!(
                    path = %path,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    reason = %reason,
                    "Retrying request"
                );
            }
            ClientEvent::RateLimitWait {
                path,
                wait,
                reset_at,
            } => {
                tracing::warn!(
                    path = %path,
                    wait_secs = wait.as_secs(),
                    reset_at = %reset_at,
                    "Rate limited, waiting for reset"
                );
            }
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
