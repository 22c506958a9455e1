//! Progress reporting for ingest runs.
//!
//! Library code never prints. Callers pass an optional [`ProgressCallback`]
//! and render the events however they like (progress bars, log lines, or
//! nothing at all).

/// Progress events emitted while syncing repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestProgress {
    /// Fetching repository metadata.
    FetchingRepo {
        /// `owner/repo`.
        full_name: String,
    },

    /// Documentation parsed into sections.
    DocsCollected {
        full_name: String,
        /// Number of sections produced.
        sections: usize,
        /// Number of docs-folder files that were parsed.
        files: usize,
    },

    /// Fetching one kind of extended metadata (languages, issues, ...).
    FetchingMetadata {
        full_name: String,
        kind: &'static str,
    },

    /// Extended metadata could not be fetched and was skipped.
    MetadataSkipped {
        full_name: String,
        kind: &'static str,
        error: String,
    },

    /// A repository was stored.
    RepoSynced {
        full_name: String,
        /// Stored project name.
        project: String,
        sections: usize,
    },

    /// Listing repositories for a user or organization.
    ListingRepos {
        owner: String,
    },

    /// Listing finished and filters were applied.
    ReposListed {
        owner: String,
        /// Repositories returned by GitHub.
        total: usize,
        /// Repositories left after filtering.
        matched: usize,
    },

    /// Starting a batch.
    BatchStarted {
        /// 1-indexed.
        batch: usize,
        batches: usize,
        size: usize,
    },

    /// A repository was skipped because it was synced recently.
    RepoSkipped {
        full_name: String,
        position: usize,
        total: usize,
    },

    /// Starting a repository within a batch run.
    RepoStarted {
        full_name: String,
        /// 1-indexed position in the filtered list.
        position: usize,
        total: usize,
    },

    /// A repository failed; the batch continues.
    RepoFailed {
        full_name: String,
        error: String,
    },

    /// The API quota ran out; the batch stops here.
    RateLimited {
        full_name: String,
        wait_secs: u64,
    },

    /// Sleeping between batches.
    Pausing {
        secs: u64,
        /// Remaining API quota when the pause started.
        remaining: u32,
    },

    /// The run was cancelled between repositories.
    Cancelled,

    /// Batch run finished.
    BatchComplete {
        synced: usize,
        failed: usize,
        skipped: usize,
        rate_limited: bool,
    },
}

/// Callback receiving [`IngestProgress`] events.
pub type ProgressCallback = Box<dyn Fn(IngestProgress) + Send + Sync>;

/// Emit `event` if a callback is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: IngestProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn emit_without_callback_is_a_no_op() {
        emit(None, IngestProgress::Cancelled);
    }

    #[test]
    fn emit_forwards_events_in_order() {
        let seen: Arc<Mutex<Vec<IngestProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let capture = Arc::clone(&seen);
        let cb: ProgressCallback = Box::new(move |event| {
            capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });

        emit(
            Some(&cb),
            IngestProgress::ListingRepos {
                owner: "octocat".into(),
            },
        );
        emit(Some(&cb), IngestProgress::Cancelled);

        let seen = seen.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[0], IngestProgress::ListingRepos { owner } if owner == "octocat"));
        assert_eq!(seen[1], IngestProgress::Cancelled);
    }
}
