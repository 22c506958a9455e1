//! Initial migration: projects, documentation sections, component links and
//! the per-project GitHub metadata tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_projects(manager).await?;
        self.create_document_sections(manager).await?;
        self.create_project_components(manager).await?;
        self.create_contributors(manager).await?;
        self.create_issues(manager).await?;
        self.create_languages(manager).await?;
        self.create_branches(manager).await?;
        self.create_dependencies(manager).await?;
        self.create_pull_requests(manager).await?;
        self.create_releases(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Alias::new("project_releases"),
            Alias::new("project_pull_requests"),
            Alias::new("project_dependencies"),
            Alias::new("project_branches"),
            Alias::new("project_languages"),
            Alias::new("project_issues"),
            Alias::new("project_contributors"),
            Alias::new("project_components"),
            Alias::new("document_sections"),
            Alias::new("projects"),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

/// Shared `id`, `project_id` (cascading FK) and `created_at` columns.
fn child_table<T: Iden + Copy + 'static>(table: T, id: T, project_id: T, created_at: T) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(id).uuid().not_null().primary_key())
        .col(ColumnDef::new(project_id).uuid().not_null())
        .col(
            ColumnDef::new(created_at)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .foreign_key(
            ForeignKey::create()
                .from(table, project_id)
                .to(Projects::Table, Projects::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

async fn index_project_id<T: Iden + Copy + 'static>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    project_id: T,
) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .name(name)
                .table(table)
                .col(project_id)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

impl Migration {
    async fn create_projects(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).uuid().not_null().primary_key())
                    // Naming
                    .col(
                        ColumnDef::new(Projects::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Projects::FullName).string().null())
                    .col(ColumnDef::new(Projects::Description).text().null())
                    // Sources
                    .col(ColumnDef::new(Projects::RepositoryUrl).string().null())
                    .col(ColumnDef::new(Projects::DocumentationPath).string().null())
                    // GitHub
                    .col(ColumnDef::new(Projects::GithubOwner).string().null())
                    .col(ColumnDef::new(Projects::GithubRepo).string().null())
                    .col(ColumnDef::new(Projects::GithubStars).integer().null())
                    .col(ColumnDef::new(Projects::GithubLanguage).string().null())
                    // Timestamps
                    .col(
                        ColumnDef::new(Projects::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Projects::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_document_sections(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                child_table(
                    DocumentSections::Table,
                    DocumentSections::Id,
                    DocumentSections::ProjectId,
                    DocumentSections::CreatedAt,
                )
                .col(ColumnDef::new(DocumentSections::Title).string().not_null())
                .col(ColumnDef::new(DocumentSections::Content).text().not_null())
                .col(
                    ColumnDef::new(DocumentSections::Level)
                        .string()
                        .not_null()
                        .default("overview"),
                )
                .col(
                    ColumnDef::new(DocumentSections::SectionType)
                        .string()
                        .not_null()
                        .default("general"),
                )
                .col(ColumnDef::new(DocumentSections::SourceFile).string().null())
                .col(
                    ColumnDef::new(DocumentSections::Order)
                        .integer()
                        .not_null()
                        .default(0),
                )
                .col(
                    ColumnDef::new(DocumentSections::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .to_owned(),
            )
            .await?;

        index_project_id(
            manager,
            "idx_document_sections_project",
            DocumentSections::Table,
            DocumentSections::ProjectId,
        )
        .await
    }

    async fn create_project_components(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProjectComponents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectComponents::ParentId).uuid().not_null())
                    .col(ColumnDef::new(ProjectComponents::ChildId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProjectComponents::RelationshipType)
                            .string()
                            .not_null()
                            .default("component"),
                    )
                    .col(
                        ColumnDef::new(ProjectComponents::Order)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectComponents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(ProjectComponents::ParentId)
                            .col(ProjectComponents::ChildId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProjectComponents::Table, ProjectComponents::ParentId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProjectComponents::Table, ProjectComponents::ChildId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        index_project_id(
            manager,
            "idx_project_components_child",
            ProjectComponents::Table,
            ProjectComponents::ChildId,
        )
        .await
    }

    async fn create_contributors(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        use ProjectContributors as T;
        manager
            .create_table(
                child_table(T::Table, T::Id, T::ProjectId, T::CreatedAt)
                    .col(ColumnDef::new(T::Username).string().not_null())
                    .col(ColumnDef::new(T::AvatarUrl).string().null())
                    .col(ColumnDef::new(T::Contributions).integer().not_null().default(0))
                    .col(ColumnDef::new(T::ProfileUrl).string().null())
                    .to_owned(),
            )
            .await?;
        index_project_id(manager, "idx_project_contributors_project", T::Table, T::ProjectId).await
    }

    async fn create_issues(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        use ProjectIssues as T;
        manager
            .create_table(
                child_table(T::Table, T::Id, T::ProjectId, T::CreatedAt)
                    .col(ColumnDef::new(T::IssueNumber).big_integer().not_null())
                    .col(ColumnDef::new(T::Title).string().not_null())
                    .col(ColumnDef::new(T::State).string().not_null().default("open"))
                    .col(ColumnDef::new(T::Author).string().null())
                    .col(ColumnDef::new(T::Labels).string().null())
                    .col(ColumnDef::new(T::IssueCreatedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(T::IssueUpdatedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;
        index_project_id(manager, "idx_project_issues_project", T::Table, T::ProjectId).await
    }

    async fn create_languages(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        use ProjectLanguages as T;
        manager
            .create_table(
                child_table(T::Table, T::Id, T::ProjectId, T::CreatedAt)
                    .col(ColumnDef::new(T::Language).string().not_null())
                    .col(ColumnDef::new(T::BytesCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(T::Percentage).double().not_null().default(0.0))
                    .col(ColumnDef::new(T::FileExtensions).string().null())
                    .col(ColumnDef::new(T::Encoding).string().null())
                    .to_owned(),
            )
            .await?;
        index_project_id(manager, "idx_project_languages_project", T::Table, T::ProjectId).await
    }

    async fn create_branches(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        use ProjectBranches as T;
        manager
            .create_table(
                child_table(T::Table, T::Id, T::ProjectId, T::CreatedAt)
                    .col(ColumnDef::new(T::Name).string().not_null())
                    .col(ColumnDef::new(T::IsDefault).boolean().not_null().default(false))
                    .col(ColumnDef::new(T::IsProtected).boolean().not_null().default(false))
                    .col(ColumnDef::new(T::CommitSha).string().null())
                    .col(ColumnDef::new(T::CommitMessage).string().null())
                    .col(ColumnDef::new(T::CommitAuthor).string().null())
                    .col(ColumnDef::new(T::CommitDate).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;
        index_project_id(manager, "idx_project_branches_project", T::Table, T::ProjectId).await
    }

    async fn create_dependencies(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        use ProjectDependencies as T;
        manager
            .create_table(
                child_table(T::Table, T::Id, T::ProjectId, T::CreatedAt)
                    .col(ColumnDef::new(T::Name).string().not_null())
                    .col(ColumnDef::new(T::VersionSpec).string().null())
                    .col(ColumnDef::new(T::DepType).string().not_null().default("runtime"))
                    .col(ColumnDef::new(T::Source).string().not_null())
                    .to_owned(),
            )
            .await?;
        index_project_id(manager, "idx_project_dependencies_project", T::Table, T::ProjectId).await
    }

    async fn create_pull_requests(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        use ProjectPullRequests as T;
        manager
            .create_table(
                child_table(T::Table, T::Id, T::ProjectId, T::CreatedAt)
                    .col(ColumnDef::new(T::PrNumber).big_integer().not_null())
                    .col(ColumnDef::new(T::Title).string().not_null())
                    .col(ColumnDef::new(T::State).string().not_null().default("open"))
                    .col(ColumnDef::new(T::Author).string().null())
                    .col(ColumnDef::new(T::BaseBranch).string().null())
                    .col(ColumnDef::new(T::HeadBranch).string().null())
                    .col(ColumnDef::new(T::IsDraft).boolean().not_null().default(false))
                    .col(ColumnDef::new(T::IsMerged).boolean().not_null().default(false))
                    .col(ColumnDef::new(T::Additions).big_integer().not_null().default(0))
                    .col(ColumnDef::new(T::Deletions).big_integer().not_null().default(0))
                    .col(ColumnDef::new(T::Labels).string().null())
                    .col(ColumnDef::new(T::PrCreatedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(T::PrUpdatedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(T::PrMergedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;
        index_project_id(manager, "idx_project_pull_requests_project", T::Table, T::ProjectId).await
    }

    async fn create_releases(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        use ProjectReleases as T;
        manager
            .create_table(
                child_table(T::Table, T::Id, T::ProjectId, T::CreatedAt)
                    .col(ColumnDef::new(T::TagName).string().not_null())
                    .col(ColumnDef::new(T::Name).string().null())
                    .col(ColumnDef::new(T::Body).text().null())
                    .col(ColumnDef::new(T::IsPrerelease).boolean().not_null().default(false))
                    .col(ColumnDef::new(T::IsDraft).boolean().not_null().default(false))
                    .col(ColumnDef::new(T::Author).string().null())
                    .col(ColumnDef::new(T::TargetCommitish).string().null())
                    .col(ColumnDef::new(T::HtmlUrl).string().null())
                    .col(ColumnDef::new(T::ReleaseCreatedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(T::ReleasePublishedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;
        index_project_id(manager, "idx_project_releases_project", T::Table, T::ProjectId).await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Projects {
    Table,
    Id,
    Name,
    FullName,
    Description,
    RepositoryUrl,
    DocumentationPath,
    GithubOwner,
    GithubRepo,
    GithubStars,
    GithubLanguage,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum DocumentSections {
    Table,
    Id,
    ProjectId,
    Title,
    Content,
    Level,
    SectionType,
    SourceFile,
    Order,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectComponents {
    Table,
    ParentId,
    ChildId,
    RelationshipType,
    Order,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectContributors {
    Table,
    Id,
    ProjectId,
    Username,
    AvatarUrl,
    Contributions,
    ProfileUrl,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectIssues {
    Table,
    Id,
    ProjectId,
    IssueNumber,
    Title,
    State,
    Author,
    Labels,
    IssueCreatedAt,
    IssueUpdatedAt,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectLanguages {
    Table,
    Id,
    ProjectId,
    Language,
    BytesCount,
    Percentage,
    FileExtensions,
    Encoding,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectBranches {
    Table,
    Id,
    ProjectId,
    Name,
    IsDefault,
    IsProtected,
    CommitSha,
    CommitMessage,
    CommitAuthor,
    CommitDate,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectDependencies {
    Table,
    Id,
    ProjectId,
    Name,
    VersionSpec,
    DepType,
    Source,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectPullRequests {
    Table,
    Id,
    ProjectId,
    PrNumber,
    Title,
    State,
    Author,
    BaseBranch,
    HeadBranch,
    IsDraft,
    IsMerged,
    Additions,
    Deletions,
    Labels,
    PrCreatedAt,
    PrUpdatedAt,
    PrMergedAt,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectReleases {
    Table,
    Id,
    ProjectId,
    TagName,
    Name,
    Body,
    IsPrerelease,
    IsDraft,
    Author,
    TargetCommitish,
    HtmlUrl,
    ReleaseCreatedAt,
    ReleasePublishedAt,
    CreatedAt,
}
