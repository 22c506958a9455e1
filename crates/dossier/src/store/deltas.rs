use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::delta_link::{
    ActiveModel as LinkActiveModel, Column as LinkColumn, DeltaLinkType, Entity as DeltaLink,
    Model as LinkModel,
};
use crate::entity::delta_note::{
    ActiveModel as NoteActiveModel, Column as NoteColumn, Entity as DeltaNote, Model as NoteModel,
};
use crate::entity::delta_phase::{DeltaPhase, DeltaPriority, DeltaType};
use crate::entity::project::Model as ProjectModel;
use crate::entity::project_delta::{ActiveModel, Column, Entity as ProjectDelta, Model};

use super::errors::{Result, StoreError};

/// Fields for a new delta. It starts in [`DeltaPhase::Brainstorm`].
#[derive(Debug, Clone, Default)]
pub struct NewDelta {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: DeltaPriority,
    pub delta_type: DeltaType,
    pub issue_number: Option<i64>,
    pub pr_number: Option<i64>,
    pub branch_name: Option<String>,
}

impl NewDelta {
    /// A delta titled after its name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            ..Self::default()
        }
    }
}

/// Insert a delta under `project`.
///
/// # Errors
/// `DuplicateDelta` when the project already has a delta of that name.
pub async fn create(db: &DatabaseConnection, project: &ProjectModel, delta: NewDelta) -> Result<Model> {
    let name = delta.name.trim().to_string();
    if name.is_empty() {
        return Err(StoreError::invalid("delta name must not be empty"));
    }
    if find(db, project.id, &name).await?.is_some() {
        return Err(StoreError::DuplicateDelta {
            project: project.name.clone(),
            name,
        });
    }
    let title = match delta.title.trim() {
        "" => name.clone(),
        title => title.to_string(),
    };

    let now = Utc::now().fixed_offset();
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project.id),
        name: Set(name),
        title: Set(title),
        description: Set(delta.description),
        phase: Set(DeltaPhase::Brainstorm),
        phase_changed_at: Set(now),
        priority: Set(delta.priority),
        delta_type: Set(delta.delta_type),
        started_at: Set(None),
        completed_at: Set(None),
        issue_number: Set(delta.issue_number),
        pr_number: Set(delta.pr_number),
        branch_name: Set(delta.branch_name),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?)
}

pub async fn find(db: &DatabaseConnection, project_id: Uuid, name: &str) -> Result<Option<Model>> {
    Ok(ProjectDelta::find()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::Name.eq(name))
        .one(db)
        .await?)
}

pub async fn get(db: &DatabaseConnection, project: &ProjectModel, name: &str) -> Result<Model> {
    find(db, project.id, name)
        .await?
        .ok_or_else(|| StoreError::DeltaNotFound {
            project: project.name.clone(),
            name: name.to_string(),
        })
}

/// A project's deltas, most recently updated first. Closed deltas are
/// left out unless `include_closed`.
pub async fn list(db: &DatabaseConnection, project_id: Uuid, include_closed: bool) -> Result<Vec<Model>> {
    let mut select = ProjectDelta::find().filter(Column::ProjectId.eq(project_id));
    if !include_closed {
        select = select.filter(Column::Phase.is_not_in([DeltaPhase::Complete, DeltaPhase::Abandoned]));
    }
    Ok(select
        .order_by_desc(Column::UpdatedAt)
        .order_by_asc(Column::Name)
        .all(db)
        .await?)
}

async fn set_phase(db: &DatabaseConnection, delta: Model, phase: DeltaPhase) -> Result<Model> {
    let now = Utc::now().fixed_offset();
    let started = delta.started_at.is_some();
    let mut active = delta.into_active_model();
    active.phase = Set(phase);
    active.phase_changed_at = Set(now);
    active.updated_at = Set(now);
    if phase == DeltaPhase::Implementation && !started {
        active.started_at = Set(Some(now));
    }
    if phase == DeltaPhase::Complete {
        active.completed_at = Set(Some(now));
    }
    Ok(active.update(db).await?)
}

/// Move a delta to its next phase. Entering `implementation` stamps
/// `started_at` once; entering `complete` stamps `completed_at`.
///
/// # Errors
/// `InvalidInput` when the delta is complete or abandoned.
pub async fn advance(db: &DatabaseConnection, delta: Model) -> Result<Model> {
    let Some(next) = delta.phase.next() else {
        return Err(StoreError::invalid(format!(
            "delta {} is {} and cannot advance",
            delta.name, delta.phase
        )));
    };
    set_phase(db, delta, next).await
}

/// Mark a delta abandoned.
///
/// # Errors
/// `InvalidInput` when the delta is already complete or abandoned.
pub async fn abandon(db: &DatabaseConnection, delta: Model) -> Result<Model> {
    if delta.phase.is_closed() {
        return Err(StoreError::invalid(format!(
            "delta {} is already {}",
            delta.name, delta.phase
        )));
    }
    set_phase(db, delta, DeltaPhase::Abandoned).await
}

/// Delete a delta with its notes and links.
pub async fn remove(db: &DatabaseConnection, delta: &Model) -> Result<()> {
    ProjectDelta::delete_by_id(delta.id).exec(db).await?;
    Ok(())
}

/// Record a note against the delta's current phase.
pub async fn add_note(db: &DatabaseConnection, delta: &Model, content: &str) -> Result<NoteModel> {
    let content = content.trim();
    if content.is_empty() {
        return Err(StoreError::invalid("note must not be empty"));
    }
    let now = Utc::now().fixed_offset();
    let note = NoteActiveModel {
        id: Set(Uuid::new_v4()),
        delta_id: Set(delta.id),
        phase: Set(delta.phase),
        content: Set(content.to_string()),
        created_at: Set(now),
    }
    .insert(db)
    .await?;
    touch(db, delta, now).await?;
    Ok(note)
}

/// Notes, oldest first.
pub async fn notes(db: &DatabaseConnection, delta_id: Uuid) -> Result<Vec<NoteModel>> {
    Ok(DeltaNote::find()
        .filter(NoteColumn::DeltaId.eq(delta_id))
        .order_by_asc(NoteColumn::CreatedAt)
        .all(db)
        .await?)
}

/// Link a delta to an issue or PR number, or to a branch, doc or delta
/// name. `target` is parsed as a number for issues and PRs; a leading `#`
/// is allowed.
pub async fn add_link(
    db: &DatabaseConnection,
    delta: &Model,
    link_type: DeltaLinkType,
    target: &str,
) -> Result<LinkModel> {
    let target = target.trim();
    let (target_number, target_name) = if link_type.takes_number() {
        let number = target
            .trim_start_matches('#')
            .parse::<i64>()
            .map_err(|_| StoreError::invalid(format!("{link_type} link needs a number, got {target:?}")))?;
        (Some(number), None)
    } else if target.is_empty() {
        return Err(StoreError::invalid(format!("{link_type} link needs a name")));
    } else {
        (None, Some(target.to_string()))
    };

    let now = Utc::now().fixed_offset();
    let link = LinkActiveModel {
        id: Set(Uuid::new_v4()),
        delta_id: Set(delta.id),
        link_type: Set(link_type),
        target_number: Set(target_number),
        target_name: Set(target_name),
        created_at: Set(now),
    }
    .insert(db)
    .await?;
    touch(db, delta, now).await?;
    Ok(link)
}

pub async fn links(db: &DatabaseConnection, delta_id: Uuid) -> Result<Vec<LinkModel>> {
    Ok(DeltaLink::find()
        .filter(LinkColumn::DeltaId.eq(delta_id))
        .order_by_asc(LinkColumn::CreatedAt)
        .all(db)
        .await?)
}

/// Link counts keyed by delta id, for every delta in `delta_ids`.
pub async fn link_counts(db: &DatabaseConnection, delta_ids: Vec<Uuid>) -> Result<HashMap<Uuid, usize>> {
    if delta_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut counts = HashMap::new();
    for link in DeltaLink::find()
        .filter(LinkColumn::DeltaId.is_in(delta_ids))
        .all(db)
        .await?
    {
        *counts.entry(link.delta_id).or_insert(0) += 1;
    }
    Ok(counts)
}

async fn touch(db: &DatabaseConnection, delta: &Model, now: chrono::DateTime<chrono::FixedOffset>) -> Result<()> {
    let mut active = delta.clone().into_active_model();
    active.updated_at = Set(now);
    active.update(db).await?;
    Ok(())
}
