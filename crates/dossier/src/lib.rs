//! Dossier - project documentation and GitHub metadata in one place.
//!
//! This library parses Markdown documentation into leveled sections, mirrors
//! GitHub repository metadata into a local database, links projects into
//! component hierarchies, and renders portable dossier reports.
//!
//! # Features
//!
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//! - `sqlite` / `postgres` - Database backends.
//!
//! # Example
//!
//! ```ignore
//! use dossier::{connect_and_migrate, github::{ClientOptions, GitHubClient, RepoRef}, ingest};
//!
//! let db = connect_and_migrate("sqlite://dossier.db?mode=rwc").await?;
//! let client = GitHubClient::new(ClientOptions::default())?;
//!
//! let repo = RepoRef::parse("https://github.com/tokio-rs/axum")?;
//! let summary = ingest::sync_repository(&client, &db, &repo, &Default::default(), None).await?;
//! println!("{} sections", summary.sections);
//! ```

pub mod api;
pub mod db;
pub mod entity;
pub mod github;
pub mod http;
pub mod ingest;
pub mod parsers;
pub mod report;
pub mod retry;
pub mod store;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use store::StoreError;
