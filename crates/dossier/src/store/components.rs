use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::project::{Entity as Project, Model as ProjectModel};
use crate::entity::project_component::{ActiveModel, Column, Entity as ProjectComponent, Model};
use crate::entity::relationship_type::RelationshipType;

use super::errors::{Result, StoreError};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default depth bound for [`tree`].
pub const DEFAULT_TREE_DEPTH: usize = 8;

/// A link resolved to project names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentLink {
    pub parent_id: Uuid,
    pub parent: String,
    pub child_id: Uuid,
    pub child: String,
    pub relationship_type: RelationshipType,
    pub order: i32,
}

/// One row of a flattened component tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentNode {
    /// 1 for direct children.
    pub depth: usize,
    pub project: ProjectModel,
    pub relationship_type: RelationshipType,
    pub order: i32,
    /// The project already appeared higher up; its children are not listed
    /// again.
    pub cycle: bool,
}

async fn find_link(db: &DatabaseConnection, parent_id: Uuid, child_id: Uuid) -> Result<Option<Model>> {
    Ok(ProjectComponent::find_by_id((parent_id, child_id))
        .one(db)
        .await?)
}

/// Link `child` under `parent`.
///
/// # Errors
/// `SelfReference` when both are the same project, `ComponentExists` when
/// the link is already present.
pub async fn add(
    db: &DatabaseConnection,
    parent: &ProjectModel,
    child: &ProjectModel,
    relationship_type: RelationshipType,
    order: i32,
) -> Result<Model> {
    if parent.id == child.id {
        return Err(StoreError::SelfReference {
            name: parent.name.clone(),
        });
    }
    if find_link(db, parent.id, child.id).await?.is_some() {
        return Err(StoreError::ComponentExists {
            parent: parent.name.clone(),
            child: child.name.clone(),
        });
    }

    let model = ActiveModel {
        parent_id: Set(parent.id),
        child_id: Set(child.id),
        relationship_type: Set(relationship_type),
        order: Set(order),
        created_at: Set(Utc::now().fixed_offset()),
    };
    Ok(model.insert(db).await?)
}

/// Like [`add`], but an existing link is left alone. Returns `true` when
/// a link was created.
pub async fn add_if_missing(
    db: &DatabaseConnection,
    parent: &ProjectModel,
    child: &ProjectModel,
    relationship_type: RelationshipType,
    order: i32,
) -> Result<bool> {
    match add(db, parent, child, relationship_type, order).await {
        Ok(_) => Ok(true),
        Err(StoreError::ComponentExists { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Change the type and/or position of an existing link.
pub async fn update(
    db: &DatabaseConnection,
    parent: &ProjectModel,
    child: &ProjectModel,
    relationship_type: Option<RelationshipType>,
    order: Option<i32>,
) -> Result<Model> {
    let link = find_link(db, parent.id, child.id)
        .await?
        .ok_or_else(|| StoreError::ComponentNotFound {
            parent: parent.name.clone(),
            child: child.name.clone(),
        })?;

    if relationship_type.is_none() && order.is_none() {
        return Ok(link);
    }

    let mut active = link.into_active_model();
    if let Some(relationship_type) = relationship_type {
        active.relationship_type = Set(relationship_type);
    }
    if let Some(order) = order {
        active.order = Set(order);
    }
    Ok(active.update(db).await?)
}

pub async fn remove(db: &DatabaseConnection, parent: &ProjectModel, child: &ProjectModel) -> Result<()> {
    let result = ProjectComponent::delete_by_id((parent.id, child.id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(StoreError::ComponentNotFound {
            parent: parent.name.clone(),
            child: child.name.clone(),
        });
    }
    Ok(())
}

async fn projects_by_id(db: &DatabaseConnection, ids: Vec<Uuid>) -> Result<HashMap<Uuid, ProjectModel>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let projects = Project::find()
        .filter(crate::entity::project::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(projects.into_iter().map(|p| (p.id, p)).collect())
}

/// Direct children of `parent_id` with their links, by `order`.
pub async fn children(db: &DatabaseConnection, parent_id: Uuid) -> Result<Vec<(Model, ProjectModel)>> {
    let links = ProjectComponent::find()
        .filter(Column::ParentId.eq(parent_id))
        .order_by_asc(Column::Order)
        .all(db)
        .await?;
    let mut projects = projects_by_id(db, links.iter().map(|l| l.child_id).collect()).await?;
    Ok(links
        .into_iter()
        .filter_map(|l| projects.remove(&l.child_id).map(|p| (l, p)))
        .collect())
}

/// Projects that list `child_id` as a component.
pub async fn parents(db: &DatabaseConnection, child_id: Uuid) -> Result<Vec<(Model, ProjectModel)>> {
    let links = ProjectComponent::find()
        .filter(Column::ChildId.eq(child_id))
        .all(db)
        .await?;
    let mut projects = projects_by_id(db, links.iter().map(|l| l.parent_id).collect()).await?;
    let mut pairs: Vec<_> = links
        .into_iter()
        .filter_map(|l| projects.remove(&l.parent_id).map(|p| (l, p)))
        .collect();
    pairs.sort_by(|a, b| a.1.name.cmp(&b.1.name));
    Ok(pairs)
}

/// Every link, optionally of one type, ordered by parent name then order.
pub async fn list_all(
    db: &DatabaseConnection,
    relationship_type: Option<RelationshipType>,
) -> Result<Vec<ComponentLink>> {
    let mut select = ProjectComponent::find();
    if let Some(relationship_type) = relationship_type {
        select = select.filter(Column::RelationshipType.eq(relationship_type));
    }
    let links = select.all(db).await?;

    let ids: HashSet<Uuid> = links
        .iter()
        .flat_map(|l| [l.parent_id, l.child_id])
        .collect();
    let projects = projects_by_id(db, ids.into_iter().collect()).await?;

    let mut resolved: Vec<ComponentLink> = links
        .into_iter()
        .filter_map(|l| {
            Some(ComponentLink {
                parent_id: l.parent_id,
                parent: projects.get(&l.parent_id)?.name.clone(),
                child_id: l.child_id,
                child: projects.get(&l.child_id)?.name.clone(),
                relationship_type: l.relationship_type,
                order: l.order,
            })
        })
        .collect();
    resolved.sort_by(|a, b| a.parent.cmp(&b.parent).then(a.order.cmp(&b.order)));
    Ok(resolved)
}

/// One past the highest `order` among `parent_id`'s children, or 0.
pub async fn next_order(db: &DatabaseConnection, parent_id: Uuid) -> Result<i32> {
    let max: Option<i32> = ProjectComponent::find()
        .select_only()
        .column_as(Column::Order.max(), "max_order")
        .filter(Column::ParentId.eq(parent_id))
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    Ok(max.map_or(0, |m| m.saturating_add(1)))
}

/// Depth-first listing of everything below `root_id`, up to `max_depth`
/// levels. A project that is already an ancestor on the current path is
/// marked as a cycle and not expanded.
pub async fn tree(db: &DatabaseConnection, root_id: Uuid, max_depth: usize) -> Result<Vec<ComponentNode>> {
    let mut nodes = Vec::new();
    let mut path = vec![root_id];
    walk(db, root_id, 1, max_depth, &mut path, &mut nodes).await?;
    Ok(nodes)
}

fn walk<'a>(
    db: &'a DatabaseConnection,
    id: Uuid,
    depth: usize,
    max_depth: usize,
    path: &'a mut Vec<Uuid>,
    nodes: &'a mut Vec<ComponentNode>,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        if depth > max_depth {
            return Ok(());
        }
        for (link, project) in children(db, id).await? {
            let child_id = project.id;
            let cycle = path.contains(&child_id);
            nodes.push(ComponentNode {
                depth,
                project,
                relationship_type: link.relationship_type,
                order: link.order,
                cycle,
            });
            if !cycle {
                path.push(child_id);
                walk(db, child_id, depth + 1, max_depth, path, nodes).await?;
                path.pop();
            }
        }
        Ok(())
    })
}
