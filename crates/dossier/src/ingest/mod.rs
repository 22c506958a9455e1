//! Pulling GitHub repositories into the store.
//!
//! - [`progress`] - `IngestProgress` events and the `emit` helper
//! - [`docs`] - README and docs-folder collection
//! - [`pipeline`] - `sync_repository` for a single repository
//! - [`batch`] - `sync_many` for every repository of a user or org
//! - [`autolink`] - a component graph built from the synced data

pub mod autolink;
pub mod batch;
pub mod docs;
mod error;
pub mod pipeline;
mod progress;

pub use autolink::{AutolinkOptions, LinkStats};
pub use batch::{BatchOptions, BatchSummary, RepoFilter, RepoSource, sync_many};
pub use docs::{CollectedDocs, collect_repo_sections};
pub use error::{IngestError, Result};
pub use pipeline::{IngestOptions, IngestSummary, derive_versions, sync_repository};
pub use progress::{IngestProgress, ProgressCallback, emit};
