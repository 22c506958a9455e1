//! DeltaNote entity - a Markdown note recorded against a delta.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::delta_phase::DeltaPhase;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delta_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub delta_id: Uuid,
    /// The delta's phase when the note was written.
    pub phase: DeltaPhase,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project_delta::Entity",
        from = "Column::DeltaId",
        to = "super::project_delta::Column::Id",
        on_delete = "Cascade"
    )]
    Delta,
}

impl Related<super::project_delta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Delta.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
