//! Project, docs and dossier handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::entity::doc_level::DocLevel;
use crate::entity::prelude::ProjectModel;
use crate::entity::section_type::SectionType;
use crate::report::{self, Dossier};
use crate::store::{self, NewProject, SectionQuery};

use super::components::list_components;
use super::error::{ApiError, Result};
use super::{AppState, ProjectPath};

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub documentation_path: Option<String>,
}

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectModel>>> {
    Ok(Json(store::projects::list(&state.db).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProject>,
) -> Result<(StatusCode, Json<ProjectModel>)> {
    let project = store::projects::create(
        &state.db,
        NewProject {
            name: body.name,
            description: body.description,
            repository_url: body.repository_url,
            documentation_path: body.documentation_path,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ComponentsParams {
    #[serde(default)]
    pub include_parents: bool,
}

/// `GET /projects/{*path}`: a project, or its component list.
pub async fn get_project_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<ComponentsParams>,
) -> Result<Response> {
    match ProjectPath::parse(&path) {
        ProjectPath::Project(name) => {
            let project = find_project(&state, &name).await?;
            Ok(Json(project).into_response())
        }
        ProjectPath::Components(name) => {
            let listing = list_components(&state, &name, params.include_parents).await?;
            Ok(Json(listing).into_response())
        }
        ProjectPath::Component { .. } => Err(ApiError::NotFound("Not Found".to_string())),
    }
}

pub(super) async fn find_project(state: &AppState, name: &str) -> Result<ProjectModel> {
    store::projects::find_by_name(&state.db, name)
        .await?
        .ok_or_else(ApiError::project_not_found)
}

#[derive(Debug, Default, Deserialize)]
pub struct DocsParams {
    pub level: Option<String>,
    pub section_type: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SectionView {
    pub title: String,
    pub content: String,
    pub section_type: SectionType,
    pub level: DocLevel,
}

#[derive(Debug, Serialize)]
pub struct DocsResponse {
    pub project_name: String,
    pub level: DocLevel,
    pub sections: Vec<SectionView>,
    pub total_sections: usize,
    pub query_time_ms: f64,
}

pub async fn query_docs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<DocsParams>,
) -> Result<Json<DocsResponse>> {
    let started = Instant::now();
    let level = match params.level.as_deref() {
        Some(raw) => raw.parse::<DocLevel>().map_err(ApiError::BadRequest)?,
        None => DocLevel::default(),
    };
    let section_type = params
        .section_type
        .as_deref()
        .map(str::parse::<SectionType>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let project = find_project(&state, name.trim_matches('/')).await?;
    let filter = SectionQuery {
        max_level: level,
        section_type,
        search: params.search,
    };
    let sections: Vec<SectionView> = store::sections::query(&state.db, project.id, &filter)
        .await?
        .into_iter()
        .map(|s| SectionView {
            title: s.title,
            content: s.content,
            section_type: s.section_type,
            level: s.level,
        })
        .collect();

    Ok(Json(DocsResponse {
        project_name: project.name,
        level,
        total_sections: sections.len(),
        sections,
        query_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DossierParams {
    #[serde(default = "yes")]
    pub include_docs: bool,
    #[serde(default = "yes")]
    pub include_activity: bool,
}

fn yes() -> bool {
    true
}

pub async fn get_dossier(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<DossierParams>,
) -> Result<Json<Dossier>> {
    let project = find_project(&state, name.trim_matches('/')).await?;
    let dossier = report::generate(
        &state.db,
        &project,
        params.include_docs,
        params.include_activity,
    )
    .await?;
    Ok(Json(dossier))
}
