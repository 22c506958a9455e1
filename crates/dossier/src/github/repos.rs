//! Repository-level reads: metadata, README and docs, search, and owner
//! listings.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::client::GitHubClient;
use super::error::{GitHubError, Result};
use super::pagination::{MAX_PER_PAGE, PageLimits};
use super::rate_limit::RateLimitInfo;
use super::repo_url::RepoRef;
use super::types::{
    ApiContent, ApiContentListing, ApiRateLimitResponse, ApiRepo, ApiSearchResult, ApiUser,
    DocFile, GitHubRepo, SearchResults,
};

/// Extensions listed as documentation.
pub const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "txt"];
/// Directory names that are searched for documentation.
pub const DOC_DIRECTORIES: &[&str] = &["docs", "doc", "documentation"];

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

fn is_doc_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            DOC_EXTENSIONS
                .iter()
                .any(|d| d.eq_ignore_ascii_case(ext))
        })
}

fn is_doc_directory(name: &str) -> bool {
    DOC_DIRECTORIES.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// Decode a base64 `content` payload (GitHub wraps it at 60 columns).
fn decode_content(path: &str, content: &str) -> Result<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| GitHubError::InvalidContent {
            path: path.to_string(),
            message: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| GitHubError::InvalidContent {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn content_text(path: &str, item: ApiContent) -> Result<Option<String>> {
    match item.content.as_deref() {
        Some(content) if !content.is_empty() => decode_content(path, content).map(Some),
        _ => Ok(None),
    }
}

impl GitHubClient {
    pub async fn get_repo(&self, repo: &RepoRef) -> Result<GitHubRepo> {
        let path = format!("repos/{}/{}", repo.owner, repo.name);
        let api: ApiRepo = self.get_json(&path, &[]).await?;
        Ok(api.into())
    }

    /// README text, or `None` when the repository has none.
    pub async fn get_readme(&self, repo: &RepoRef) -> Result<Option<String>> {
        let path = format!("repos/{}/{}/readme", repo.owner, repo.name);
        match self.get_optional::<ApiContent>(&path, &[]).await? {
            Some(item) => content_text(&path, item),
            None => Ok(None),
        }
    }

    /// File text at `file_path`, or `None` when it does not exist.
    pub async fn get_file_content(&self, repo: &RepoRef, file_path: &str) -> Result<Option<String>> {
        let path = format!("repos/{}/{}/contents/{}", repo.owner, repo.name, file_path);
        match self.get_optional::<ApiContent>(&path, &[]).await? {
            Some(item) => content_text(&path, item),
            None => Ok(None),
        }
    }

    /// Documentation files at the repository root and inside `docs/`-style
    /// directories, at any depth.
    pub async fn list_docs_files(&self, repo: &RepoRef, git_ref: Option<&str>) -> Result<Vec<DocFile>> {
        self.list_docs_in(repo, String::new(), git_ref).await
    }

    fn list_docs_in<'a>(
        &'a self,
        repo: &'a RepoRef,
        dir: String,
        git_ref: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<DocFile>>> {
        Box::pin(async move {
            let path = format!("repos/{}/{}/contents/{}", repo.owner, repo.name, dir);
            let params: Vec<(&str, String)> = git_ref
                .map(|r| vec![("ref", r.to_string())])
                .unwrap_or_default();

            let Some(listing) = self.get_optional::<ApiContentListing>(&path, &params).await?
            else {
                return Ok(Vec::new());
            };

            let mut files = Vec::new();
            for item in listing.into_vec() {
                match item.kind.as_str() {
                    "file" if is_doc_file(&item.name) => files.push(DocFile {
                        name: item.name,
                        path: item.path,
                    }),
                    "dir" if is_doc_directory(&item.name) => {
                        files.extend(self.list_docs_in(repo, item.path, git_ref).await?);
                    }
                    _ => {}
                }
            }
            Ok(files)
        })
    }

    /// Search repositories. `sort` is `stars`, `forks` or `updated`.
    pub async fn search_repos(&self, query: &str, sort: &str, limit: u32) -> Result<SearchResults> {
        let params = [
            ("q", query.to_string()),
            ("sort", sort.to_string()),
            ("order", "desc".to_string()),
            ("per_page", limit.clamp(1, MAX_PER_PAGE).to_string()),
        ];
        let result: ApiSearchResult = self.get_json("search/repositories", &params).await?;
        Ok(SearchResults {
            total_count: result.total_count,
            repos: result.items.into_iter().map(GitHubRepo::from).collect(),
        })
    }

    /// Repositories owned by `username`, most recently updated first.
    pub async fn list_user_repos(&self, username: &str) -> Result<Vec<GitHubRepo>> {
        let params = [("type", "owner".to_string()), ("sort", "updated".to_string())];
        let repos: Vec<ApiRepo> = self
            .paginate(
                &format!("users/{username}/repos"),
                &params,
                PageLimits::unbounded(MAX_PER_PAGE),
            )
            .await?;
        Ok(repos.into_iter().map(GitHubRepo::from).collect())
    }

    /// Every repository of `org`, most recently updated first.
    pub async fn list_org_repos(&self, org: &str) -> Result<Vec<GitHubRepo>> {
        let params = [("type", "all".to_string()), ("sort", "updated".to_string())];
        let repos: Vec<ApiRepo> = self
            .paginate(
                &format!("orgs/{org}/repos"),
                &params,
                PageLimits::unbounded(MAX_PER_PAGE),
            )
            .await?;
        Ok(repos.into_iter().map(GitHubRepo::from).collect())
    }

    pub async fn get_authenticated_user(&self) -> Result<ApiUser> {
        self.get_json("user", &[]).await
    }

    /// Core quota from `/rate_limit`. The result also refreshes the
    /// client's cached quota.
    pub async fn check_rate_limit(&self) -> Result<RateLimitInfo> {
        let response: ApiRateLimitResponse = self.get_json("rate_limit", &[]).await?;
        let info = RateLimitInfo::from(&response.resources.core);
        self.store_rate_limit(info);
        Ok(info)
    }

    /// Every quota `/rate_limit` reports, by resource name.
    pub async fn rate_limit_resources(&self) -> Result<Vec<(&'static str, RateLimitInfo)>> {
        let response: ApiRateLimitResponse = self.get_json("rate_limit", &[]).await?;
        let core = RateLimitInfo::from(&response.resources.core);
        self.store_rate_limit(core);

        let mut resources = vec![("core", core)];
        if let Some(search) = &response.resources.search {
            resources.push(("search", RateLimitInfo::from(search)));
        }
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::test_support::*;
    use super::*;
    use crate::http::MockTransport;
    use serde_json::json;

    fn repo_ref() -> RepoRef {
        RepoRef::new("acme", "widget")
    }

    fn encoded(text: &str) -> String {
        // Wrapped like the API does.
        let raw = STANDARD.encode(text);
        raw.as_bytes()
            .chunks(60)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn repo_json(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "full_name": format!("acme/{name}"),
            "owner": {"login": "acme"},
            "html_url": format!("https://github.com/acme/{name}"),
            "description": "Widgets",
            "default_branch": "trunk",
            "language": "Rust",
            "stargazers_count": 42,
            "topics": ["cli"]
        })
    }

    #[test]
    fn doc_file_and_directory_matching() {
        assert!(is_doc_file("guide.md"));
        assert!(is_doc_file("NOTES.TXT"));
        assert!(is_doc_file("intro.rst"));
        assert!(!is_doc_file("main.rs"));
        assert!(!is_doc_file("Makefile"));
        assert!(is_doc_directory("Docs"));
        assert!(is_doc_directory("documentation"));
        assert!(!is_doc_directory("src"));
    }

    #[tokio::test]
    async fn get_repo_maps_metadata() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/repos/acme/widget"), 200, repo_json("widget"));
        let client = mock_client(&transport);

        let repo = client.get_repo(&repo_ref()).await.expect("repo");
        assert_eq!(repo.full_name, "acme/widget");
        assert_eq!(repo.default_branch, "trunk");
        assert_eq!(repo.stars, 42);
        assert_eq!(repo.topics, vec!["cli".to_string()]);
    }

    #[tokio::test]
    async fn readme_is_decoded_and_missing_readme_is_none() {
        let transport = MockTransport::new();
        let text = "# Widget\n\nA long enough readme to wrap across base64 lines.\n";
        transport.push_json(
            format!("{API}/repos/acme/widget/readme"),
            200,
            json!({"name": "README.md", "path": "README.md", "type": "file", "content": encoded(text)}),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/readme"),
            404,
            json!({"message": "Not Found"}),
        );
        let client = mock_client(&transport);

        let readme = client.get_readme(&repo_ref()).await.expect("readme");
        assert_eq!(readme.as_deref(), Some(text));
        assert_eq!(client.get_readme(&repo_ref()).await.expect("404"), None);
    }

    #[tokio::test]
    async fn invalid_base64_is_an_error() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/pyproject.toml"),
            200,
            json!({"name": "pyproject.toml", "path": "pyproject.toml", "type": "file", "content": "!!!"}),
        );
        let client = mock_client(&transport);

        let err = client
            .get_file_content(&repo_ref(), "pyproject.toml")
            .await
            .expect_err("bad base64");
        assert!(matches!(err, GitHubError::InvalidContent { .. }));
    }

    #[tokio::test]
    async fn docs_listing_recurses_into_doc_directories_only() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/"),
            200,
            json!([
                {"name": "README.md", "path": "README.md", "type": "file"},
                {"name": "Cargo.toml", "path": "Cargo.toml", "type": "file"},
                {"name": "src", "path": "src", "type": "dir"},
                {"name": "docs", "path": "docs", "type": "dir"},
                {"name": "CHANGES.rst", "path": "CHANGES.rst", "type": "file"}
            ]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/docs"),
            200,
            json!([
                {"name": "guide.md", "path": "docs/guide.md", "type": "file"},
                {"name": "doc", "path": "docs/doc", "type": "dir"}
            ]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/docs/doc"),
            404,
            json!({"message": "Not Found"}),
        );
        let client = mock_client(&transport);

        let files = client.list_docs_files(&repo_ref(), None).await.expect("docs");
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "docs/guide.md", "CHANGES.rst"]);
    }

    #[tokio::test]
    async fn docs_listing_passes_ref() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/?ref=v2"),
            200,
            json!({"name": "only.md", "path": "only.md", "type": "file"}),
        );
        let client = mock_client(&transport);

        let files = client
            .list_docs_files(&repo_ref(), Some("v2"))
            .await
            .expect("docs");
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn search_clamps_per_page_and_orders_desc() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/search/repositories?q=widget+language%3Arust&sort=stars&order=desc&per_page=100"),
            200,
            json!({"total_count": 1234, "items": [repo_json("widget")]}),
        );
        let client = mock_client(&transport);

        let results = client
            .search_repos("widget language:rust", "stars", 500)
            .await
            .expect("search");
        assert_eq!(results.total_count, 1234);
        assert_eq!(results.repos[0].name, "widget");
    }

    #[tokio::test]
    async fn user_repos_follow_pages() {
        let transport = MockTransport::new();
        let first: Vec<_> = (0..100).map(|i| repo_json(&format!("r{i}"))).collect();
        transport.push_json(
            format!("{API}/users/acme/repos?type=owner&sort=updated&per_page=100&page=1"),
            200,
            json!(first),
        );
        transport.push_json(
            format!("{API}/users/acme/repos?type=owner&sort=updated&per_page=100&page=2"),
            200,
            json!([repo_json("last")]),
        );
        let client = mock_client(&transport);

        let repos = client.list_user_repos("acme").await.expect("repos");
        assert_eq!(repos.len(), 101);
        assert_eq!(repos[100].name, "last");
    }

    #[tokio::test]
    async fn org_repos_use_type_all() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/orgs/acme/repos?type=all&sort=updated&per_page=100&page=1"),
            200,
            json!([repo_json("one")]),
        );
        let client = mock_client(&transport);

        let repos = client.list_org_repos("acme").await.expect("repos");
        assert_eq!(repos.len(), 1);
    }

    #[tokio::test]
    async fn rate_limit_reads_core_resource() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/rate_limit"),
            200,
            json!({"resources": {
                "core": {"limit": 5000, "remaining": 4990, "reset": 1_900_000_000, "used": 10},
                "search": {"limit": 30, "remaining": 30, "reset": 1_900_000_000, "used": 0}
            }}),
        );
        let client = mock_client(&transport);

        let info = client.check_rate_limit().await.expect("limits");
        assert_eq!(info.limit, 5000);
        assert_eq!(info.remaining, 4990);
    }

    #[tokio::test]
    async fn rate_limit_resources_lists_core_and_search() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/rate_limit"),
            200,
            json!({"resources": {
                "core": {"limit": 5000, "remaining": 12, "reset": 1_900_000_000},
                "search": {"limit": 30, "remaining": 29, "reset": 1_900_000_000}
            }}),
        );
        let client = mock_client(&transport);

        let resources = client.rate_limit_resources().await.expect("limits");
        let names: Vec<_> = resources.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["core", "search"]);
        assert_eq!(resources[1].1.remaining, 29);
        assert_eq!(client.rate_limit().remaining, 12);
    }

    #[tokio::test]
    async fn authenticated_user_requires_token() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/user"), 401, json!({"message": "Requires authentication"}));
        let client = mock_client(&transport);

        let err = client.get_authenticated_user().await.expect_err("401");
        assert!(matches!(err, GitHubError::AuthRequired));
    }
}
