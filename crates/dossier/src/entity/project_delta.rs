//! ProjectDelta entity - a tracked unit of work on a project.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::delta_phase::{DeltaPhase, DeltaPriority, DeltaType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_deltas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,

    /// Short identifier, unique within the project, e.g. `add-dark-mode`.
    pub name: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    // ─── Lifecycle ───────────────────────────────────────────────────────────
    pub phase: DeltaPhase,
    pub phase_changed_at: DateTimeWithTimeZone,
    pub priority: DeltaPriority,
    pub delta_type: DeltaType,
    /// Set on first entering `implementation`.
    pub started_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,

    // ─── GitHub ──────────────────────────────────────────────────────────────
    pub issue_number: Option<i64>,
    pub pr_number: Option<i64>,
    pub branch_name: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(has_many = "super::delta_note::Entity")]
    Notes,
    #[sea_orm(has_many = "super::delta_link::Entity")]
    Links,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::delta_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl Related<super::delta_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn can_advance(&self) -> bool {
        self.phase.next().is_some()
    }
}
