//! ProjectRelease entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_releases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub tag_name: String,
    pub name: Option<String>,
    /// Release notes, truncated to 500 characters.
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    pub is_prerelease: bool,
    pub is_draft: bool,
    pub author: Option<String>,
    pub target_commitish: Option<String>,
    pub html_url: Option<String>,
    pub release_created_at: Option<DateTimeWithTimeZone>,
    pub release_published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
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
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
