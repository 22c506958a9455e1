//! DocumentSection entity - one heading-delimited chunk of documentation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::doc_level::DocLevel;
use super::section_type::SectionType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document_sections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub level: DocLevel,
    pub section_type: SectionType,

    /// Where the section came from, e.g. `github:owner/repo/README.md`.
    pub source_file: Option<String>,
    /// Position within the project's documentation.
    pub order: i32,

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
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Case-insensitive substring match over title and content.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.content.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn matches_title_or_content_ignoring_case() {
        let now = Utc::now().fixed_offset();
        let section = Model {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Installation".into(),
            content: "Run `cargo install dossier`.".into(),
            level: DocLevel::Overview,
            section_type: SectionType::Setup,
            source_file: None,
            order: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(section.matches("INSTALL"));
        assert!(section.matches("cargo"));
        assert!(!section.matches("docker"));
    }
}
