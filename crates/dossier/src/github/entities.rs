//! Per-repository entity fetchers: contributors, issues, pull requests,
//! releases, branches, languages and dependency manifests.

use super::client::GitHubClient;
use super::error::{GitHubError, Result};
use super::languages::language_info;
use super::pagination::PageLimits;
use super::repo_url::RepoRef;
use super::types::{
    ApiBranch, ApiCommit, ApiContributor, ApiIssue, ApiPull, ApiRelease, BranchRecord,
    ContributorRecord, IssueRecord, LanguageRecord, PullRequestRecord, ReleaseRecord, join_labels,
};
use crate::parsers::manifest::{
    DependencyRecord, parse_package_json, parse_pyproject, parse_requirements,
};

/// Release bodies longer than this are cut.
pub const MAX_RELEASE_BODY: usize = 500;
/// First-line commit messages are cut to this many characters.
pub const MAX_COMMIT_MESSAGE: usize = 100;

/// Caps on how many of each entity one sync stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub per_page: u32,
    pub contributors: usize,
    pub issues: usize,
    pub pull_requests: usize,
    pub releases: usize,
    pub branches: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            per_page: 30,
            contributors: 100,
            issues: 100,
            pull_requests: 50,
            releases: 20,
            branches: 100,
        }
    }
}

impl FetchLimits {
    /// Smaller caps used when syncing many repositories at once.
    pub fn batch() -> Self {
        Self {
            per_page: 30,
            contributors: 10,
            issues: 20,
            pull_requests: 20,
            releases: 10,
            branches: 20,
        }
    }

    fn pages(&self, max_items: usize) -> PageLimits {
        PageLimits::new(self.per_page, max_items)
    }
}

fn repo_path(repo: &RepoRef, rest: &str) -> String {
    format!("repos/{}/{}/{rest}", repo.owner, repo.name)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn truncate_body(body: String) -> String {
    if body.chars().count() > MAX_RELEASE_BODY {
        format!("{}...", truncate_chars(&body, MAX_RELEASE_BODY - 3))
    } else {
        body
    }
}

impl GitHubClient {
    /// Contributors by commit count. Anonymous entries are dropped.
    pub async fn list_contributors(
        &self,
        repo: &RepoRef,
        limits: &FetchLimits,
    ) -> Result<Vec<ContributorRecord>> {
        let raw: Vec<ApiContributor> = self
            .paginate_filtered(
                &repo_path(repo, "contributors"),
                &[],
                limits.pages(limits.contributors),
                |c: &ApiContributor| c.login.is_some(),
            )
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|c| {
                Some(ContributorRecord {
                    username: c.login?,
                    avatar_url: c.avatar_url,
                    contributions: i64::try_from(c.contributions).unwrap_or(i64::MAX),
                    profile_url: c.html_url,
                })
            })
            .collect())
    }

    /// Issues in every state. Pull requests listed by the issues endpoint
    /// are skipped.
    pub async fn list_issues(&self, repo: &RepoRef, limits: &FetchLimits) -> Result<Vec<IssueRecord>> {
        let raw: Vec<ApiIssue> = self
            .paginate_filtered(
                &repo_path(repo, "issues"),
                &[("state", "all".to_string())],
                limits.pages(limits.issues),
                |i: &ApiIssue| i.pull_request.is_none(),
            )
            .await?;

        Ok(raw
            .into_iter()
            .map(|i| IssueRecord {
                labels: join_labels(&i.labels),
                issue_number: i.number,
                title: i.title,
                state: i.state,
                author: i.user.map(|u| u.login),
                created_at: i.created_at,
                updated_at: i.updated_at,
            })
            .collect())
    }

    /// Pull requests in every state, most recently updated first.
    pub async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        limits: &FetchLimits,
    ) -> Result<Vec<PullRequestRecord>> {
        let params = [
            ("state", "all".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
        ];
        let raw: Vec<ApiPull> = self
            .paginate(
                &repo_path(repo, "pulls"),
                &params,
                limits.pages(limits.pull_requests),
            )
            .await?;

        Ok(raw
            .into_iter()
            .map(|p| {
                let is_merged = p.merged_at.is_some();
                PullRequestRecord {
                    labels: join_labels(&p.labels),
                    pr_number: p.number,
                    title: p.title,
                    state: if is_merged { "merged".to_string() } else { p.state },
                    author: p.user.map(|u| u.login),
                    base_branch: p.base.map(|b| b.ref_name),
                    head_branch: p.head.map(|h| h.ref_name),
                    is_draft: p.draft,
                    is_merged,
                    additions: p.additions,
                    deletions: p.deletions,
                    created_at: p.created_at,
                    updated_at: p.updated_at,
                    merged_at: p.merged_at,
                }
            })
            .collect())
    }

    pub async fn list_releases(
        &self,
        repo: &RepoRef,
        limits: &FetchLimits,
    ) -> Result<Vec<ReleaseRecord>> {
        let raw: Vec<ApiRelease> = self
            .paginate(
                &repo_path(repo, "releases"),
                &[],
                limits.pages(limits.releases),
            )
            .await?;

        Ok(raw
            .into_iter()
            .map(|r| ReleaseRecord {
                tag_name: r.tag_name,
                name: r.name,
                body: r.body.map(truncate_body),
                is_prerelease: r.prerelease,
                is_draft: r.draft,
                author: r.author.map(|a| a.login),
                target_commitish: r.target_commitish,
                created_at: r.created_at,
                published_at: r.published_at,
                html_url: r.html_url,
            })
            .collect())
    }

    /// Branches with their head commit, default branch first.
    ///
    /// When `default_branch` is `None` it is looked up from the repository,
    /// falling back to `main`. A failed commit lookup leaves the commit
    /// fields empty; only a rate-limit rejection aborts.
    pub async fn list_branches(
        &self,
        repo: &RepoRef,
        limits: &FetchLimits,
        default_branch: Option<&str>,
    ) -> Result<Vec<BranchRecord>> {
        let default_branch = match default_branch {
            Some(name) => name.to_string(),
            None => match self.get_repo(repo).await {
                Ok(meta) => meta.default_branch,
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(_) => "main".to_string(),
            },
        };

        let raw: Vec<ApiBranch> = self
            .paginate(
                &repo_path(repo, "branches"),
                &[],
                limits.pages(limits.branches),
            )
            .await?;

        let mut branches = Vec::with_capacity(raw.len());
        for branch in raw {
            let sha = branch.commit.sha;
            let mut record = BranchRecord {
                is_default: branch.name == default_branch,
                name: branch.name,
                is_protected: branch.protected,
                commit_sha: None,
                commit_message: None,
                commit_author: None,
                commit_date: None,
            };

            if !sha.is_empty() {
                match self
                    .get_json::<ApiCommit>(&repo_path(repo, &format!("commits/{sha}")), &[])
                    .await
                {
                    Ok(commit) => {
                        let first_line = commit.commit.message.lines().next().unwrap_or_default();
                        record.commit_message = Some(truncate_chars(first_line, MAX_COMMIT_MESSAGE));
                        if let Some(author) = commit.commit.author {
                            record.commit_author = author.name;
                            record.commit_date = author.date;
                        }
                    }
                    Err(e) if e.is_rate_limited() => return Err(e),
                    Err(e) => {
                        tracing::debug!(branch = %record.name, error = %e, "Commit lookup failed");
                    }
                }
                record.commit_sha = Some(sha);
            }

            branches.push(record);
        }

        branches.sort_by(|a, b| b.is_default.cmp(&a.is_default).then_with(|| a.name.cmp(&b.name)));
        Ok(branches)
    }

    /// Language breakdown by bytes, largest first.
    pub async fn list_languages(&self, repo: &RepoRef) -> Result<Vec<LanguageRecord>> {
        let Some(raw) = self
            .get_optional::<serde_json::Map<String, serde_json::Value>>(
                &repo_path(repo, "languages"),
                &[],
            )
            .await?
        else {
            return Ok(Vec::new());
        };

        let counts: Vec<(String, i64)> = raw
            .into_iter()
            .filter_map(|(name, bytes)| bytes.as_i64().map(|b| (name, b)))
            .collect();
        let total: i64 = counts.iter().map(|(_, b)| b).sum();

        let mut languages: Vec<LanguageRecord> = counts
            .into_iter()
            .map(|(language, bytes_count)| {
                let percentage = if total > 0 {
                    (bytes_count as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
                } else {
                    0.0
                };
                let info = language_info(&language);
                LanguageRecord {
                    file_extensions: info.map(|(ext, _)| ext.to_string()),
                    encoding: info.map(|(_, enc)| enc.to_string()),
                    language,
                    bytes_count,
                    percentage,
                }
            })
            .collect();

        languages.sort_by(|a, b| b.bytes_count.cmp(&a.bytes_count));
        Ok(languages)
    }

    /// Dependencies declared in `pyproject.toml`, `package.json` and, when
    /// there is no pyproject, `requirements.txt`.
    ///
    /// Missing or unreadable manifests contribute nothing.
    pub async fn list_dependencies(&self, repo: &RepoRef) -> Result<Vec<DependencyRecord>> {
        let mut deps = Vec::new();

        let pyproject = self.manifest(repo, "pyproject.toml").await?;
        if let Some(content) = &pyproject {
            deps.extend(parse_pyproject(content));
        }

        if let Some(content) = self.manifest(repo, "package.json").await? {
            deps.extend(parse_package_json(&content));
        }

        if pyproject.is_none()
            && let Some(content) = self.manifest(repo, "requirements.txt").await?
        {
            deps.extend(parse_requirements(&content));
        }

        Ok(deps)
    }

    async fn manifest(&self, repo: &RepoRef, file: &str) -> Result<Option<String>> {
        match self.get_file_content(repo, file).await {
            Ok(content) => Ok(content),
            Err(e @ GitHubError::RateLimited { .. }) => Err(e),
            Err(e) => {
                tracing::debug!(owner = %repo.owner, repo = %repo.name, file, error = %e, "Skipping manifest");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::test_support::*;
    use super::*;
    use crate::entity::prelude::DependencyType;
    use crate::http::MockTransport;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn repo_ref() -> RepoRef {
        RepoRef::new("acme", "widget")
    }

    fn small() -> FetchLimits {
        FetchLimits {
            per_page: 2,
            ..FetchLimits::default()
        }
    }

    fn file(path: &str, text: &str) -> serde_json::Value {
        json!({"name": path, "path": path, "type": "file", "content": STANDARD.encode(text)})
    }

    #[test]
    fn batch_limits_are_smaller() {
        let batch = FetchLimits::batch();
        let full = FetchLimits::default();
        assert_eq!(batch.contributors, 10);
        assert_eq!(batch.issues, 20);
        assert_eq!(batch.branches, 20);
        assert_eq!(batch.pull_requests, 20);
        assert_eq!(batch.releases, 10);
        assert_eq!(full.pull_requests, 50);
        assert_eq!(full.releases, 20);
    }

    #[test]
    fn release_body_truncation() {
        let short = "a".repeat(500);
        assert_eq!(truncate_body(short.clone()), short);

        let long = "b".repeat(501);
        let cut = truncate_body(long);
        assert_eq!(cut.chars().count(), 500);
        assert!(cut.ends_with("..."));
    }

    #[tokio::test]
    async fn contributors_skip_anonymous_entries() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/contributors?per_page=2&page=1"),
            200,
            json!([
                {"login": "alice", "contributions": 40, "html_url": "https://github.com/alice"},
                {"contributions": 3, "type": "Anonymous"}
            ]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contributors?per_page=2&page=2"),
            200,
            json!([]),
        );
        let client = mock_client(&transport);

        let people = client
            .list_contributors(&repo_ref(), &small())
            .await
            .expect("contributors");
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].username, "alice");
        assert_eq!(people[0].contributions, 40);
    }

    #[tokio::test]
    async fn issues_skip_pull_requests_and_join_labels() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/issues?state=all&per_page=2&page=1"),
            200,
            json!([
                {"number": 1, "title": "Crash", "state": "open", "user": {"login": "bob"},
                 "labels": [{"name": "bug"}, {"name": "p1"}]},
                {"number": 2, "title": "PR", "state": "open", "pull_request": {"url": "x"}}
            ]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/issues?state=all&per_page=2&page=2"),
            200,
            json!([{"number": 3, "title": "Docs", "state": "closed"}]),
        );
        let client = mock_client(&transport);

        let issues = client.list_issues(&repo_ref(), &small()).await.expect("issues");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].labels.as_deref(), Some("bug,p1"));
        assert_eq!(issues[0].author.as_deref(), Some("bob"));
        assert_eq!(issues[1].issue_number, 3);
        assert_eq!(issues[1].labels, None);
    }

    #[tokio::test]
    async fn merged_pull_requests_report_merged_state() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/pulls?state=all&sort=updated&direction=desc&per_page=2&page=1"),
            200,
            json!([
                {"number": 7, "title": "Feature", "state": "closed",
                 "merged_at": "2025-01-02T03:04:05Z",
                 "base": {"ref": "main"}, "head": {"ref": "feature"}},
                {"number": 8, "title": "WIP", "state": "open", "draft": true}
            ]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/pulls?state=all&sort=updated&direction=desc&per_page=2&page=2"),
            200,
            json!([]),
        );
        let client = mock_client(&transport);

        let prs = client
            .list_pull_requests(&repo_ref(), &small())
            .await
            .expect("pulls");
        assert_eq!(prs[0].state, "merged");
        assert!(prs[0].is_merged);
        assert_eq!(prs[0].base_branch.as_deref(), Some("main"));
        assert_eq!(prs[1].state, "open");
        assert!(prs[1].is_draft);
        assert!(!prs[1].is_merged);
    }

    #[tokio::test]
    async fn branches_sort_default_first_and_tolerate_commit_failures() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/branches?per_page=2&page=1"),
            200,
            json!([
                {"name": "feature", "protected": false, "commit": {"sha": "aaa"}},
                {"name": "trunk", "protected": true, "commit": {"sha": "bbb"}}
            ]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/branches?per_page=2&page=2"),
            200,
            json!([]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/commits/aaa"),
            404,
            json!({"message": "Not Found"}),
        );
        let long_subject = "x".repeat(150);
        transport.push_json(
            format!("{API}/repos/acme/widget/commits/bbb"),
            200,
            json!({"commit": {
                "message": format!("{long_subject}\n\nbody"),
                "author": {"name": "Carol", "date": "2025-02-01T00:00:00Z"}
            }}),
        );
        let client = mock_client(&transport);

        let branches = client
            .list_branches(&repo_ref(), &small(), Some("trunk"))
            .await
            .expect("branches");
        assert_eq!(branches[0].name, "trunk");
        assert!(branches[0].is_default);
        assert!(branches[0].is_protected);
        assert_eq!(branches[0].commit_message.as_deref().map(str::len), Some(100));
        assert_eq!(branches[0].commit_author.as_deref(), Some("Carol"));
        assert_eq!(branches[1].name, "feature");
        assert_eq!(branches[1].commit_sha.as_deref(), Some("aaa"));
        assert_eq!(branches[1].commit_message, None);
    }

    #[tokio::test]
    async fn branches_fall_back_to_main_when_repo_lookup_fails() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/repos/acme/widget"), 500, json!({}));
        transport.push_json(
            format!("{API}/repos/acme/widget/branches?per_page=2&page=1"),
            200,
            json!([{"name": "main", "protected": false, "commit": {"sha": ""}}]),
        );
        let client = GitHubClient::with_transport(
            std::sync::Arc::new(transport.clone()),
            super::super::client::ClientOptions {
                requests_per_second: None,
                retry: crate::retry::RetryConfig::disabled(),
                ..Default::default()
            },
        );

        let branches = client
            .list_branches(&repo_ref(), &small(), None)
            .await
            .expect("branches");
        assert_eq!(branches.len(), 1);
        assert!(branches[0].is_default);
        assert_eq!(branches[0].commit_sha, None);
    }

    #[tokio::test]
    async fn languages_round_and_sort_by_bytes() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/languages"),
            200,
            json!({"Shell": 1000, "Rust": 2000}),
        );
        let client = mock_client(&transport);

        let langs = client.list_languages(&repo_ref()).await.expect("languages");
        assert_eq!(langs[0].language, "Rust");
        assert_eq!(langs[0].percentage, 66.67);
        assert_eq!(langs[1].percentage, 33.33);
        assert_eq!(langs[0].file_extensions.as_deref(), Some(".rs"));
    }

    #[tokio::test]
    async fn languages_missing_repo_is_empty() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/repos/acme/widget/languages"), 404, json!({}));
        let client = mock_client(&transport);
        assert!(client.list_languages(&repo_ref()).await.expect("404").is_empty());
    }

    #[tokio::test]
    async fn requirements_only_read_without_pyproject() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/pyproject.toml"),
            404,
            json!({}),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/package.json"),
            200,
            file("package.json", r#"{"devDependencies": {"jest": "^29"}}"#),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/requirements.txt"),
            200,
            file("requirements.txt", "requests>=2\n# comment\n-e .\n"),
        );
        let client = mock_client(&transport);

        let deps = client.list_dependencies(&repo_ref()).await.expect("deps");
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "jest");
        assert_eq!(deps[0].dep_type, DependencyType::Dev);
        assert_eq!(deps[1].name, "requests");
        assert_eq!(deps[1].source, "requirements.txt");
    }

    #[tokio::test]
    async fn pyproject_suppresses_requirements() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/pyproject.toml"),
            200,
            file("pyproject.toml", "[project]\ndependencies = [\"httpx>=0.27\"]\n"),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/package.json"),
            404,
            json!({}),
        );
        let client = mock_client(&transport);

        let deps = client.list_dependencies(&repo_ref()).await.expect("deps");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].version_spec.as_deref(), Some(">=0.27"));
        assert_eq!(transport.request_count(), 2);
    }
}
