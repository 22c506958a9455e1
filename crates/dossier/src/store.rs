//! Persistence operations over the dossier schema.
//!
//! Functions take a `&DatabaseConnection` and return [`Result`]. Writes that
//! replace a set of rows run in a transaction.

pub mod components;
pub mod deltas;
mod errors;
pub mod metadata;
pub mod projects;
pub mod sections;
pub mod stats;

pub use components::{ComponentLink, ComponentNode, DEFAULT_TREE_DEPTH};
pub use deltas::NewDelta;
pub use errors::{Result, StoreError};
pub use metadata::VersionRecord;
pub use projects::{EntityProject, NewProject};
pub use sections::SectionQuery;
pub use stats::{ClearCounts, ClearScope, DatabaseStats};

/// Rows per multi-row INSERT.
pub(crate) const INSERT_CHUNK: usize = 100;
