use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::doc_level::DocLevel;
use crate::entity::document_section::{ActiveModel, Column, Entity as DocumentSection, Model};
use crate::entity::section_type::SectionType;
use crate::parsers::ParsedSection;

use super::INSERT_CHUNK;
use super::errors::Result;

/// Filters for [`query`].
#[derive(Debug, Clone, Default)]
pub struct SectionQuery {
    /// Deepest level to include; shallower levels are always included.
    pub max_level: DocLevel,
    pub section_type: Option<SectionType>,
    /// Case-insensitive substring over title and content.
    pub search: Option<String>,
}

fn to_active(project_id: Uuid, section: &ParsedSection) -> ActiveModel {
    let now = Utc::now().fixed_offset();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        title: Set(section.title.clone()),
        content: Set(section.content.clone()),
        level: Set(section.level),
        section_type: Set(section.section_type),
        source_file: Set(section.source_file.clone()),
        order: Set(section.order),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

async fn insert_sections<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    sections: &[ParsedSection],
) -> Result<u64> {
    let mut inserted = 0;
    for chunk in sections.chunks(INSERT_CHUNK) {
        let models: Vec<_> = chunk.iter().map(|s| to_active(project_id, s)).collect();
        inserted += DocumentSection::insert_many(models)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(inserted)
}

/// Append sections to a project.
pub async fn add_many(
    db: &DatabaseConnection,
    project_id: Uuid,
    sections: &[ParsedSection],
) -> Result<u64> {
    insert_sections(db, project_id, sections).await
}

/// Swap a project's sections for `sections` in one transaction.
pub async fn replace_for_project(
    db: &DatabaseConnection,
    project_id: Uuid,
    sections: &[ParsedSection],
) -> Result<u64> {
    let txn = db.begin().await?;
    DocumentSection::delete_many()
        .filter(Column::ProjectId.eq(project_id))
        .exec(&txn)
        .await?;
    let inserted = insert_sections(&txn, project_id, sections).await?;
    txn.commit().await?;
    Ok(inserted)
}

/// A project's sections in document order.
pub async fn for_project(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<Model>> {
    Ok(DocumentSection::find()
        .filter(Column::ProjectId.eq(project_id))
        .order_by_asc(Column::Order)
        .all(db)
        .await?)
}

pub async fn count_for_project(db: &DatabaseConnection, project_id: Uuid) -> Result<u64> {
    Ok(DocumentSection::find()
        .filter(Column::ProjectId.eq(project_id))
        .count(db)
        .await?)
}

/// Sections at or above `max_level`, optionally narrowed by type and a
/// text search, in document order.
pub async fn query(
    db: &DatabaseConnection,
    project_id: Uuid,
    filter: &SectionQuery,
) -> Result<Vec<Model>> {
    let mut select = DocumentSection::find()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::Level.is_in(filter.max_level.up_to()));
    if let Some(section_type) = filter.section_type {
        select = select.filter(Column::SectionType.eq(section_type));
    }

    let sections = select.order_by_asc(Column::Order).all(db).await?;

    Ok(match filter.search.as_deref().map(str::trim) {
        Some(needle) if !needle.is_empty() => {
            sections.into_iter().filter(|s| s.matches(needle)).collect()
        }
        _ => sections,
    })
}
