//! JSON web API over the store and the GitHub client.
//!
//! Project names may contain `/` (`owner/repo`), so every route that takes a
//! name uses a catch-all segment and splits the component suffix itself.

mod components;
mod error;
mod github;
mod projects;

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::github::GitHubClient;

pub use error::{ApiError, Result};

pub const API_NAME: &str = "Dossier API";
pub const API_DESCRIPTION: &str = "Documentation standardization API";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub github: GitHubClient,
}

impl AppState {
    pub fn new(db: DatabaseConnection, github: GitHubClient) -> Self {
        Self { db, github }
    }
}

/// What a `/projects/...` path refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProjectPath {
    Project(String),
    Components(String),
    Component { parent: String, child: String },
}

impl ProjectPath {
    pub(crate) fn parse(raw: &str) -> Self {
        let path = raw.trim_matches('/');
        if let Some((parent, child)) = path.split_once("/components/")
            && !parent.is_empty()
            && !child.is_empty()
        {
            return Self::Component {
                parent: parent.to_string(),
                child: child.trim_end_matches('/').to_string(),
            };
        }
        if let Some(parent) = path.strip_suffix("/components")
            && !parent.is_empty()
        {
            return Self::Components(parent.to_string());
        }
        Self::Project(path.to_string())
    }
}

#[derive(Serialize)]
struct RootInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn root() -> axum::Json<RootInfo> {
    axum::Json(RootInfo {
        name: API_NAME,
        version: env!("CARGO_PKG_VERSION"),
        description: API_DESCRIPTION,
    })
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health { status: "healthy" })
}

/// Build the router with every route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{*path}",
            get(projects::get_project_path)
                .post(components::add_component)
                .put(components::update_component)
                .delete(components::remove_component),
        )
        .route("/docs/{*name}", get(projects::query_docs))
        .route("/dossier/{*name}", get(projects::get_dossier))
        .route("/components", get(components::list_all_components))
        .route("/github/sync", post(github::sync_repo))
        .route("/github/info", get(github::repo_info))
        .route("/github/search", get(github::search))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::db::connect_and_migrate;
    use crate::github::test_support::mock_client;
    use crate::http::MockTransport;

    pub async fn app(transport: &MockTransport) -> (Router, DatabaseConnection) {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        let state = AppState::new(db.clone(), mock_client(transport));
        (router(state), db)
    }

    pub async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}
