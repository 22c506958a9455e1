use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_projects_full_name")
                    .table(Projects::Table)
                    .col(Projects::FullName)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_sections_level")
                    .table(DocumentSections::Table)
                    .col(DocumentSections::ProjectId)
                    .col(DocumentSections::Level)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_sections_type")
                    .table(DocumentSections::Table)
                    .col(DocumentSections::ProjectId)
                    .col(DocumentSections::SectionType)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("idx_document_sections_type", Alias::new("document_sections")),
            ("idx_document_sections_level", Alias::new("document_sections")),
            ("idx_projects_full_name", Alias::new("projects")),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    FullName,
}

#[derive(DeriveIden)]
enum DocumentSections {
    Table,
    ProjectId,
    Level,
    SectionType,
}
