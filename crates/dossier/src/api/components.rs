//! Component link handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::prelude::ProjectModel;
use crate::entity::relationship_type::RelationshipType;
use crate::store::{self, ComponentLink};

use super::error::{ApiError, Result};
use super::projects::find_project;
use super::{AppState, ProjectPath};

#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    pub parent_id: Uuid,
    pub parent_name: String,
    pub child_id: Uuid,
    pub child_name: String,
    pub relationship_type: String,
    pub order: i32,
}

impl From<ComponentLink> for ComponentInfo {
    fn from(link: ComponentLink) -> Self {
        Self {
            parent_id: link.parent_id,
            parent_name: link.parent,
            child_id: link.child_id,
            child_name: link.child,
            relationship_type: link.relationship_type.to_string(),
            order: link.order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComponentList {
    pub parent_name: String,
    pub components: Vec<ComponentInfo>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ComponentListAll {
    pub components: Vec<ComponentInfo>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct Removed {
    pub status: &'static str,
    pub parent: String,
    pub child: String,
}

fn parse_relationship(raw: &str) -> Result<RelationshipType> {
    raw.parse().map_err(ApiError::BadRequest)
}

async fn resolve_pair(state: &AppState, parent: &str, child: &str) -> Result<(ProjectModel, ProjectModel)> {
    let parent = store::projects::find_by_name(&state.db, parent)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Parent project '{parent}' not found")))?;
    let child = store::projects::find_by_name(&state.db, child)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Child project '{child}' not found")))?;
    Ok((parent, child))
}

/// Children of `name`, then its parents when `include_parents` is set.
pub(super) async fn list_components(
    state: &AppState,
    name: &str,
    include_parents: bool,
) -> Result<ComponentList> {
    let project = find_project(state, name).await?;

    let mut components: Vec<ComponentInfo> = store::components::children(&state.db, project.id)
        .await?
        .into_iter()
        .map(|(link, child)| ComponentInfo {
            parent_id: project.id,
            parent_name: project.name.clone(),
            child_id: child.id,
            child_name: child.name,
            relationship_type: link.relationship_type.to_string(),
            order: link.order,
        })
        .collect();

    if include_parents {
        let parents = store::components::parents(&state.db, project.id).await?;
        components.extend(parents.into_iter().map(|(link, parent)| ComponentInfo {
            parent_id: parent.id,
            parent_name: parent.name,
            child_id: project.id,
            child_name: project.name.clone(),
            relationship_type: format!("parent:{}", link.relationship_type),
            order: link.order,
        }));
    }

    Ok(ComponentList {
        parent_name: project.name,
        total: components.len(),
        components,
    })
}

fn component_path(path: &str) -> Result<(String, Option<String>)> {
    match ProjectPath::parse(path) {
        ProjectPath::Components(parent) => Ok((parent, None)),
        ProjectPath::Component { parent, child } => Ok((parent, Some(child))),
        ProjectPath::Project(_) => Err(ApiError::NotFound("Not Found".to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddParams {
    pub child_name: String,
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub order: i32,
}

/// `POST /projects/{name}/components?child_name=...`
pub async fn add_component(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<AddParams>,
) -> Result<(StatusCode, Json<ComponentInfo>)> {
    let (parent_name, None) = component_path(&path)? else {
        return Err(ApiError::NotFound("Not Found".to_string()));
    };
    let relationship_type = match params.relationship_type.as_deref() {
        Some(raw) => parse_relationship(raw)?,
        None => RelationshipType::default(),
    };

    let (parent, child) = resolve_pair(&state, &parent_name, &params.child_name).await?;
    let link = store::components::add(&state.db, &parent, &child, relationship_type, params.order).await?;

    Ok((
        StatusCode::CREATED,
        Json(ComponentInfo {
            parent_id: parent.id,
            parent_name: parent.name,
            child_id: child.id,
            child_name: child.name,
            relationship_type: link.relationship_type.to_string(),
            order: link.order,
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
    pub relationship_type: Option<String>,
    pub order: Option<i32>,
}

/// `PUT /projects/{name}/components/{child}`
pub async fn update_component(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<ComponentInfo>> {
    let (parent_name, Some(child_name)) = component_path(&path)? else {
        return Err(ApiError::NotFound("Not Found".to_string()));
    };
    let relationship_type = body
        .relationship_type
        .as_deref()
        .map(parse_relationship)
        .transpose()?;

    let (parent, child) = resolve_pair(&state, &parent_name, &child_name).await?;
    let link = store::components::update(&state.db, &parent, &child, relationship_type, body.order).await?;

    Ok(Json(ComponentInfo {
        parent_id: parent.id,
        parent_name: parent.name,
        child_id: child.id,
        child_name: child.name,
        relationship_type: link.relationship_type.to_string(),
        order: link.order,
    }))
}

/// `DELETE /projects/{name}/components/{child}`
pub async fn remove_component(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<Removed>> {
    let (parent_name, Some(child_name)) = component_path(&path)? else {
        return Err(ApiError::NotFound("Not Found".to_string()));
    };
    let (parent, child) = resolve_pair(&state, &parent_name, &child_name).await?;
    store::components::remove(&state.db, &parent, &child).await?;

    Ok(Json(Removed {
        status: "removed",
        parent: parent.name,
        child: child.name,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAllParams {
    pub relationship_type: Option<String>,
}

pub async fn list_all_components(
    State(state): State<AppState>,
    Query(params): Query<ListAllParams>,
) -> Result<Json<ComponentListAll>> {
    let relationship_type = params
        .relationship_type
        .as_deref()
        .map(parse_relationship)
        .transpose()?;
    let components: Vec<ComponentInfo> = store::components::list_all(&state.db, relationship_type)
        .await?
        .into_iter()
        .map(ComponentInfo::from)
        .collect();
    Ok(Json(ComponentListAll {
        total: components.len(),
        components,
    }))
}
