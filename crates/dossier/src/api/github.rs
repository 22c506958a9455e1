//! GitHub sync, info and search handlers.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::github::{GitHubError, GitHubRepo, RepoRef};
use crate::ingest::{self, IngestError, IngestOptions};

use super::AppState;
use super::error::{ApiError, Result};

pub const MAX_SEARCH_LIMIT: u32 = 100;

fn fetch_error(err: GitHubError) -> ApiError {
    ApiError::BadRequest(format!("Error fetching repository: {err}"))
}

fn parse_repo(url: &str) -> Result<RepoRef> {
    RepoRef::parse(url).map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub repo_url: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_include_docs")]
    pub include_docs: bool,
}

fn default_include_docs() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub project_name: String,
    pub repo_full_name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub language: Option<String>,
    pub sections_parsed: usize,
    pub skipped: Vec<&'static str>,
}

/// `POST /github/sync`: import one repository with best-effort metadata.
pub async fn sync_repo(
    State(state): State<AppState>,
    Json(body): Json<SyncRequest>,
) -> Result<Json<SyncResponse>> {
    let repo_ref = parse_repo(&body.repo_url)?;
    let options = IngestOptions {
        name: body.name,
        description: body.description,
        include_docs: body.include_docs,
        best_effort_metadata: true,
        ..IngestOptions::default()
    };

    let summary = ingest::sync_repository(&state.github, &state.db, &repo_ref, &options, None)
        .await
        .map_err(|err| match err {
            IngestError::GitHub(e) => fetch_error(e),
            IngestError::Store(e) => e.into(),
        })?;

    let project = super::projects::find_project(&state, &summary.project).await?;
    Ok(Json(SyncResponse {
        project_name: summary.project,
        repo_full_name: summary.full_name,
        description: project.description,
        stars: project
            .github_stars
            .and_then(|s| u64::try_from(s).ok())
            .unwrap_or_default(),
        language: project.github_language,
        sections_parsed: summary.sections,
        skipped: summary.skipped,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InfoParams {
    pub repo_url: String,
}

#[derive(Debug, Serialize)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub default_branch: String,
    pub language: Option<String>,
    pub stars: u64,
    pub topics: Vec<String>,
    pub has_readme: bool,
    pub doc_files: Vec<String>,
}

/// `GET /github/info?repo_url=...`
pub async fn repo_info(
    State(state): State<AppState>,
    Query(params): Query<InfoParams>,
) -> Result<Json<RepoInfo>> {
    let repo_ref = parse_repo(&params.repo_url)?;
    let client = &state.github;

    let repo = client.get_repo(&repo_ref).await.map_err(fetch_error)?;
    let has_readme = client
        .get_readme(&repo_ref)
        .await
        .map_err(fetch_error)?
        .is_some();
    let doc_files = client
        .list_docs_files(&repo_ref, Some(&repo.default_branch))
        .await
        .map_err(fetch_error)?
        .into_iter()
        .map(|f| f.path)
        .collect();

    let GitHubRepo {
        owner,
        name,
        full_name,
        description,
        default_branch,
        html_url,
        topics,
        language,
        stars,
        ..
    } = repo;
    Ok(Json(RepoInfo {
        owner,
        name,
        full_name,
        description,
        html_url,
        default_branch,
        language,
        stars,
        topics,
        has_readme,
        doc_files,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_sort() -> String {
    "stars".to_string()
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub repos: Vec<GitHubRepo>,
    pub total: u64,
}

/// `GET /github/search?query=...&sort=stars&limit=10`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    if !(1..=MAX_SEARCH_LIMIT).contains(&params.limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_SEARCH_LIMIT}"
        )));
    }
    let results = state
        .github
        .search_repos(&params.query, &params.sort, params.limit)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Error searching repositories: {e}")))?;
    Ok(Json(SearchResponse {
        total: results.total_count,
        repos: results.repos,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    use crate::api::test_support::{app, call};
    use crate::github::test_support::API;
    use crate::http::MockTransport;

    fn repo_json() -> serde_json::Value {
        json!({
            "name": "widget",
            "full_name": "acme/widget",
            "owner": {"login": "acme"},
            "description": "Widgets for all",
            "default_branch": "main",
            "html_url": "https://github.com/acme/widget",
            "topics": ["widgets"],
            "language": "Rust",
            "stargazers_count": 42
        })
    }

    fn readme_json() -> serde_json::Value {
        json!({
            "name": "README.md",
            "path": "README.md",
            "type": "file",
            "content": STANDARD.encode("# Widget\nIntro\n## Usage\nRun it\n")
        })
    }

    #[tokio::test]
    async fn sync_imports_and_tolerates_missing_metadata() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/repos/acme/widget"), 200, repo_json());
        transport.push_json(format!("{API}/repos/acme/widget/readme"), 200, readme_json());
        let (app, _db) = app(&transport).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/github/sync",
            Some(json!({"repo_url": "https://github.com/acme/widget", "include_docs": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["project_name"], "acme/widget");
        assert_eq!(body["repo_full_name"], "acme/widget");
        assert_eq!(body["stars"], 42);
        assert_eq!(body["language"], "Rust");
        assert_eq!(body["sections_parsed"], 2);

        let (status, body) = call(&app, Method::GET, "/projects/acme/widget", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["github_owner"], "acme");
    }

    #[tokio::test]
    async fn sync_of_missing_repo_is_a_bad_request() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/ghost"),
            404,
            json!({"message": "Not Found"}),
        );
        let (app, _db) = app(&transport).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/github/sync",
            Some(json!({"repo_url": "https://github.com/acme/ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["detail"]
                .as_str()
                .unwrap()
                .starts_with("Error fetching repository")
        );
    }

    #[tokio::test]
    async fn info_reports_readme_and_doc_files() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/repos/acme/widget"), 200, repo_json());
        transport.push_json(format!("{API}/repos/acme/widget/readme"), 200, readme_json());
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/?ref=main"),
            200,
            json!([
                {"name": "README.md", "path": "README.md", "type": "file"},
                {"name": "src", "path": "src", "type": "dir"}
            ]),
        );
        let (app, _db) = app(&transport).await;

        let (status, body) = call(
            &app,
            Method::GET,
            "/github/info?repo_url=https://github.com/acme/widget",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["full_name"], "acme/widget");
        assert_eq!(body["has_readme"], true);
        assert_eq!(body["doc_files"], json!(["README.md"]));
        assert_eq!(body["topics"], json!(["widgets"]));
    }

    #[tokio::test]
    async fn search_validates_limit() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/search/repositories?q=widget&sort=stars&order=desc&per_page=10"),
            200,
            json!({"total_count": 1, "items": [repo_json()]}),
        );
        let (app, _db) = app(&transport).await;

        let (status, body) = call(&app, Method::GET, "/github/search?query=widget", None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["total"], 1);
        assert_eq!(body["repos"][0]["full_name"], "acme/widget");

        let (status, _) = call(&app, Method::GET, "/github/search?query=widget&limit=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&app, Method::GET, "/github/search?query=widget&limit=101", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
