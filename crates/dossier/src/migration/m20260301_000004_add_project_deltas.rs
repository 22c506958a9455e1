//! Adds delta tracking: `project_deltas` with their notes and links.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProjectDeltas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectDeltas::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectDeltas::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(ProjectDeltas::Name).string().not_null())
                    .col(ColumnDef::new(ProjectDeltas::Title).string().not_null())
                    .col(ColumnDef::new(ProjectDeltas::Description).text().null())
                    .col(
                        ColumnDef::new(ProjectDeltas::Phase)
                            .string()
                            .not_null()
                            .default("brainstorm"),
                    )
                    .col(
                        ColumnDef::new(ProjectDeltas::PhaseChangedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProjectDeltas::Priority)
                            .string()
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(ProjectDeltas::DeltaType)
                            .string()
                            .not_null()
                            .default("feature"),
                    )
                    .col(
                        ColumnDef::new(ProjectDeltas::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProjectDeltas::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ProjectDeltas::IssueNumber).big_integer().null())
                    .col(ColumnDef::new(ProjectDeltas::PrNumber).big_integer().null())
                    .col(ColumnDef::new(ProjectDeltas::BranchName).string().null())
                    .col(
                        ColumnDef::new(ProjectDeltas::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProjectDeltas::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProjectDeltas::Table, ProjectDeltas::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_deltas_project_name")
                    .table(ProjectDeltas::Table)
                    .col(ProjectDeltas::ProjectId)
                    .col(ProjectDeltas::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_deltas_phase")
                    .table(ProjectDeltas::Table)
                    .col(ProjectDeltas::Phase)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DeltaNotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DeltaNotes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DeltaNotes::DeltaId).uuid().not_null())
                    .col(ColumnDef::new(DeltaNotes::Phase).string().not_null())
                    .col(ColumnDef::new(DeltaNotes::Content).text().not_null())
                    .col(
                        ColumnDef::new(DeltaNotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DeltaNotes::Table, DeltaNotes::DeltaId)
                            .to(ProjectDeltas::Table, ProjectDeltas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DeltaLinks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DeltaLinks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DeltaLinks::DeltaId).uuid().not_null())
                    .col(ColumnDef::new(DeltaLinks::LinkType).string().not_null())
                    .col(ColumnDef::new(DeltaLinks::TargetNumber).big_integer().null())
                    .col(ColumnDef::new(DeltaLinks::TargetName).string().null())
                    .col(
                        ColumnDef::new(DeltaLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DeltaLinks::Table, DeltaLinks::DeltaId)
                            .to(ProjectDeltas::Table, ProjectDeltas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, table, col) in [
            ("idx_delta_notes_delta", DeltaNotes::Table.into_iden(), DeltaNotes::DeltaId.into_iden()),
            ("idx_delta_links_delta", DeltaLinks::Table.into_iden(), DeltaLinks::DeltaId.into_iden()),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(table)
                        .col(col)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            DeltaLinks::Table.into_iden(),
            DeltaNotes::Table.into_iden(),
            ProjectDeltas::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ProjectDeltas {
    Table,
    Id,
    ProjectId,
    Name,
    Title,
    Description,
    Phase,
    PhaseChangedAt,
    Priority,
    DeltaType,
    StartedAt,
    CompletedAt,
    IssueNumber,
    PrNumber,
    BranchName,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DeltaNotes {
    Table,
    Id,
    DeltaId,
    Phase,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DeltaLinks {
    Table,
    Id,
    DeltaId,
    LinkType,
    TargetNumber,
    TargetName,
    CreatedAt,
}
