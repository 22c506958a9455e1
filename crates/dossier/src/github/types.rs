//! GitHub API wire types and the records derived from them.
//!
//! `Api*` structs mirror the JSON GitHub returns, with only the fields we
//! read. The `*Record` structs are the flattened shapes stored per project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rate_limit::RateLimitInfo;

// ─── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUserRef {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepo {
    pub name: String,
    pub full_name: String,
    pub owner: ApiUserRef,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub public_repos: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiContributor {
    /// Absent for anonymous contributors.
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssue {
    pub number: i64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub user: Option<ApiUserRef>,
    #[serde(default)]
    pub labels: Vec<ApiLabel>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Present when the issue is really a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGitRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPull {
    pub number: i64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub user: Option<ApiUserRef>,
    #[serde(default)]
    pub base: Option<ApiGitRef>,
    #[serde(default)]
    pub head: Option<ApiGitRef>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub additions: i64,
    #[serde(default)]
    pub deletions: i64,
    #[serde(default)]
    pub labels: Vec<ApiLabel>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRelease {
    #[serde(default)]
    pub id: i64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub author: Option<ApiUserRef>,
    #[serde(default)]
    pub target_commitish: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiBranch {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
    pub commit: ApiCommitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommitDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<ApiCommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommit {
    pub commit: ApiCommitDetail,
}

/// One entry of the contents API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiContent {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// The contents API returns an object for a file and an array for a directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiContentListing {
    Many(Vec<ApiContent>),
    One(ApiContent),
}

impl ApiContentListing {
    pub fn into_vec(self) -> Vec<ApiContent> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSearchResult {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<ApiRepo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRateResource {
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
    #[serde(default)]
    pub used: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRateResources {
    pub core: ApiRateResource,
    #[serde(default)]
    pub search: Option<ApiRateResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRateLimitResponse {
    pub resources: ApiRateResources,
}

impl From<&ApiRateResource> for RateLimitInfo {
    fn from(r: &ApiRateResource) -> Self {
        RateLimitInfo::from_epoch(r.limit, r.remaining, r.reset)
    }
}

// ─── Records ───────────────────────────────────────────────────────────────

/// Repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitHubRepo {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub default_branch: String,
    pub html_url: String,
    pub topics: Vec<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub is_fork: bool,
}

impl From<ApiRepo> for GitHubRepo {
    fn from(r: ApiRepo) -> Self {
        Self {
            owner: r.owner.login,
            name: r.name,
            full_name: r.full_name,
            description: r.description,
            default_branch: r.default_branch.unwrap_or_else(|| "main".to_string()),
            html_url: r.html_url,
            topics: r.topics,
            language: r.language,
            stars: r.stargazers_count,
            is_fork: r.fork,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorRecord {
    pub username: String,
    pub avatar_url: Option<String>,
    pub contributions: i64,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRecord {
    pub issue_number: i64,
    pub title: String,
    pub state: String,
    pub author: Option<String>,
    /// Comma-joined label names.
    pub labels: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestRecord {
    pub pr_number: i64,
    pub title: String,
    /// `open`, `closed` or `merged`.
    pub state: String,
    pub author: Option<String>,
    pub base_branch: Option<String>,
    pub head_branch: Option<String>,
    pub is_draft: bool,
    pub is_merged: bool,
    pub additions: i64,
    pub deletions: i64,
    pub labels: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRecord {
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    pub is_prerelease: bool,
    pub is_draft: bool,
    pub author: Option<String>,
    pub target_commitish: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRecord {
    pub name: String,
    pub is_default: bool,
    pub is_protected: bool,
    pub commit_sha: Option<String>,
    pub commit_message: Option<String>,
    pub commit_author: Option<String>,
    pub commit_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageRecord {
    pub language: String,
    pub bytes_count: i64,
    pub percentage: f64,
    pub file_extensions: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocFile {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub total_count: u64,
    pub repos: Vec<GitHubRepo>,
}

/// Join label names with commas; `None` when there are none.
pub(crate) fn join_labels(labels: &[ApiLabel]) -> Option<String> {
    if labels.is_empty() {
        None
    } else {
        Some(
            labels
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}
