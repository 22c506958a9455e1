//! Adds the `project_versions` table, derived from GitHub releases.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProjectVersions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectVersions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectVersions::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(ProjectVersions::Version).string().not_null())
                    .col(ColumnDef::new(ProjectVersions::Major).integer().not_null().default(0))
                    .col(ColumnDef::new(ProjectVersions::Minor).integer().not_null().default(0))
                    .col(ColumnDef::new(ProjectVersions::Patch).integer().not_null().default(0))
                    .col(ColumnDef::new(ProjectVersions::Prerelease).string().null())
                    .col(ColumnDef::new(ProjectVersions::BuildMetadata).string().null())
                    .col(
                        ColumnDef::new(ProjectVersions::Source)
                            .string()
                            .not_null()
                            .default("release"),
                    )
                    .col(ColumnDef::new(ProjectVersions::ReleaseId).uuid().null())
                    .col(
                        ColumnDef::new(ProjectVersions::IsLatest)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ProjectVersions::ReleaseUrl).string().null())
                    .col(ColumnDef::new(ProjectVersions::ChangelogUrl).string().null())
                    .col(
                        ColumnDef::new(ProjectVersions::ReleaseDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProjectVersions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProjectVersions::Table, ProjectVersions::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProjectVersions::Table, ProjectVersions::ReleaseId)
                            .to(ProjectReleases::Table, ProjectReleases::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_versions_project_version")
                    .table(ProjectVersions::Table)
                    .col(ProjectVersions::ProjectId)
                    .col(ProjectVersions::Version)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ProjectVersions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ProjectReleases {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ProjectVersions {
    Table,
    Id,
    ProjectId,
    Version,
    Major,
    Minor,
    Patch,
    Prerelease,
    BuildMetadata,
    Source,
    ReleaseId,
    IsLatest,
    ReleaseUrl,
    ChangelogUrl,
    ReleaseDate,
    CreatedAt,
}
