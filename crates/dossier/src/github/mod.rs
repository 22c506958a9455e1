//! GitHub REST client for repository metadata.
//!
//! # Module Structure
//!
//! - [`client`] - Authenticated requests, retries and rate-limit waits
//! - [`pagination`] - Page-number pagination with hard caps
//! - [`repos`] - Repository metadata, README/docs, search and listings
//! - [`entities`] - Contributors, issues, pull requests, releases, branches,
//!   languages and dependency manifests
//! - [`repo_url`] - `owner/repo` references parsed from URLs
//!
//! ```ignore
//! use dossier::github::{ClientOptions, GitHubClient, RepoRef};
//!
//! let client = GitHubClient::new(ClientOptions::default().with_token(token))?;
//! let repo = client.get_repo(&RepoRef::parse("https://github.com/rust-lang/rust")?).await?;
//! ```

mod client;
mod entities;
mod error;
mod languages;
mod pagination;
mod rate_limit;
mod repo_url;
mod repos;
mod types;

pub use client::{
    ACCEPT_HEADER, ClientEvent, ClientObserver, ClientOptions, DEFAULT_API_URL,
    DEFAULT_MAX_RATE_LIMIT_WAIT, GitHubClient, QueryParams, USER_AGENT,
};
pub use entities::{FetchLimits, MAX_COMMIT_MESSAGE, MAX_RELEASE_BODY};
pub use error::{GitHubError, Result, short_error_message};
pub use languages::language_info;
pub use pagination::{MAX_PER_PAGE, PageLimits};
pub use rate_limit::{ApiRateLimiter, GITHUB_DEFAULT_RPS, RateLimitInfo};
pub use repo_url::RepoRef;
pub use repos::{DOC_DIRECTORIES, DOC_EXTENSIONS};
pub use types::{
    ApiUser, BranchRecord, ContributorRecord, DocFile, GitHubRepo, IssueRecord, LanguageRecord,
    PullRequestRecord, ReleaseRecord, SearchResults,
};

#[cfg(test)]
pub(crate) use client::test_support;
