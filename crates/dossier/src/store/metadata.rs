//! GitHub metadata attached to a project.
//!
//! Every `replace_*` deletes the project's existing rows and inserts the new
//! ones inside a single transaction, so readers never see a half-synced set.

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::prelude::*;
use crate::entity::{
    project_branch, project_contributor, project_dependency, project_issue, project_language,
    project_pull_request, project_release, project_version,
};
use crate::github::{
    BranchRecord, ContributorRecord, IssueRecord, LanguageRecord, PullRequestRecord, ReleaseRecord,
};
use crate::parsers::DependencyRecord;

use super::INSERT_CHUNK;
use super::errors::Result;

/// A version to store, usually derived from a release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub version: String,
    pub semver: SemVer,
    /// Where the version came from, e.g. `release`.
    pub source: String,
    pub release_id: Option<Uuid>,
    pub is_latest: bool,
    pub release_url: Option<String>,
    pub changelog_url: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
}

async fn replace_rows<E, A>(
    db: &DatabaseConnection,
    project_column: E::Column,
    project_id: Uuid,
    rows: Vec<A>,
) -> Result<u64>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E> + Send,
    E::Model: IntoActiveModel<A>,
{
    let txn = db.begin().await?;
    E::delete_many()
        .filter(project_column.eq(project_id))
        .exec(&txn)
        .await?;

    let mut inserted = 0;
    for chunk in rows.chunks(INSERT_CHUNK) {
        inserted += E::insert_many(chunk.to_vec())
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;
    Ok(inserted)
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

fn offset(ts: Option<DateTime<Utc>>) -> Option<DateTimeWithTimeZone> {
    ts.map(|t| t.fixed_offset())
}

// ─── Replace ─────────────────────────────────────────────────────────────────

pub async fn replace_contributors(
    db: &DatabaseConnection,
    project_id: Uuid,
    records: &[ContributorRecord],
) -> Result<u64> {
    let rows = records
        .iter()
        .map(|c| project_contributor::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            username: Set(c.username.clone()),
            avatar_url: Set(c.avatar_url.clone()),
            contributions: Set(i32::try_from(c.contributions).unwrap_or(i32::MAX)),
            profile_url: Set(c.profile_url.clone()),
            created_at: Set(now()),
        })
        .collect();
    replace_rows(db, ProjectContributorColumn::ProjectId, project_id, rows).await
}

pub async fn replace_issues(db: &DatabaseConnection, project_id: Uuid, records: &[IssueRecord]) -> Result<u64> {
    let rows = records
        .iter()
        .map(|i| project_issue::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            issue_number: Set(i.issue_number),
            title: Set(i.title.clone()),
            state: Set(i.state.clone()),
            author: Set(i.author.clone()),
            labels: Set(i.labels.clone()),
            issue_created_at: Set(offset(i.created_at)),
            issue_updated_at: Set(offset(i.updated_at)),
            created_at: Set(now()),
        })
        .collect();
    replace_rows(db, ProjectIssueColumn::ProjectId, project_id, rows).await
}

pub async fn replace_pull_requests(
    db: &DatabaseConnection,
    project_id: Uuid,
    records: &[PullRequestRecord],
) -> Result<u64> {
    let rows = records
        .iter()
        .map(|p| project_pull_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            pr_number: Set(p.pr_number),
            title: Set(p.title.clone()),
            state: Set(p.state.clone()),
            author: Set(p.author.clone()),
            base_branch: Set(p.base_branch.clone()),
            head_branch: Set(p.head_branch.clone()),
            is_draft: Set(p.is_draft),
            is_merged: Set(p.is_merged),
            additions: Set(p.additions),
            deletions: Set(p.deletions),
            labels: Set(p.labels.clone()),
            pr_created_at: Set(offset(p.created_at)),
            pr_updated_at: Set(offset(p.updated_at)),
            pr_merged_at: Set(offset(p.merged_at)),
            created_at: Set(now()),
        })
        .collect();
    replace_rows(db, ProjectPullRequestColumn::ProjectId, project_id, rows).await
}

/// Replace releases and return the stored rows, newest first.
pub async fn replace_releases(
    db: &DatabaseConnection,
    project_id: Uuid,
    records: &[ReleaseRecord],
) -> Result<Vec<ProjectReleaseModel>> {
    let rows = records
        .iter()
        .map(|r| project_release::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            tag_name: Set(r.tag_name.clone()),
            name: Set(r.name.clone()),
            body: Set(r.body.clone()),
            is_prerelease: Set(r.is_prerelease),
            is_draft: Set(r.is_draft),
            author: Set(r.author.clone()),
            target_commitish: Set(r.target_commitish.clone()),
            html_url: Set(r.html_url.clone()),
            release_created_at: Set(offset(r.created_at)),
            release_published_at: Set(offset(r.published_at)),
            created_at: Set(now()),
        })
        .collect();
    replace_rows(db, ProjectReleaseColumn::ProjectId, project_id, rows).await?;
    releases(db, project_id).await
}

pub async fn replace_branches(
    db: &DatabaseConnection,
    project_id: Uuid,
    records: &[BranchRecord],
) -> Result<u64> {
    let rows = records
        .iter()
        .map(|b| project_branch::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            name: Set(b.name.clone()),
            is_default: Set(b.is_default),
            is_protected: Set(b.is_protected),
            commit_sha: Set(b.commit_sha.clone()),
            commit_message: Set(b.commit_message.clone()),
            commit_author: Set(b.commit_author.clone()),
            commit_date: Set(offset(b.commit_date)),
            created_at: Set(now()),
        })
        .collect();
    replace_rows(db, ProjectBranchColumn::ProjectId, project_id, rows).await
}

pub async fn replace_languages(
    db: &DatabaseConnection,
    project_id: Uuid,
    records: &[LanguageRecord],
) -> Result<u64> {
    let rows = records
        .iter()
        .map(|l| project_language::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            language: Set(l.language.clone()),
            bytes_count: Set(l.bytes_count),
            percentage: Set(l.percentage),
            file_extensions: Set(l.file_extensions.clone()),
            encoding: Set(l.encoding.clone()),
            created_at: Set(now()),
        })
        .collect();
    replace_rows(db, ProjectLanguageColumn::ProjectId, project_id, rows).await
}

pub async fn replace_dependencies(
    db: &DatabaseConnection,
    project_id: Uuid,
    records: &[DependencyRecord],
) -> Result<u64> {
    let rows = records
        .iter()
        .map(|d| project_dependency::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            name: Set(d.name.clone()),
            version_spec: Set(d.version_spec.clone()),
            dep_type: Set(d.dep_type),
            source: Set(d.source.clone()),
            created_at: Set(now()),
        })
        .collect();
    replace_rows(db, ProjectDependencyColumn::ProjectId, project_id, rows).await
}

pub async fn replace_versions(
    db: &DatabaseConnection,
    project_id: Uuid,
    records: &[VersionRecord],
) -> Result<u64> {
    let rows = records
        .iter()
        .map(|v| project_version::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            version: Set(v.version.clone()),
            major: Set(v.semver.major),
            minor: Set(v.semver.minor),
            patch: Set(v.semver.patch),
            prerelease: Set(v.semver.prerelease.clone()),
            build_metadata: Set(v.semver.build_metadata.clone()),
            source: Set(v.source.clone()),
            release_id: Set(v.release_id),
            is_latest: Set(v.is_latest),
            release_url: Set(v.release_url.clone()),
            changelog_url: Set(v.changelog_url.clone()),
            release_date: Set(offset(v.release_date)),
            created_at: Set(now()),
        })
        .collect();
    replace_rows(db, ProjectVersionColumn::ProjectId, project_id, rows).await
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// Contributors by commit count, highest first.
pub async fn contributors(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<ProjectContributorModel>> {
    Ok(ProjectContributor::find()
        .filter(ProjectContributorColumn::ProjectId.eq(project_id))
        .order_by_desc(ProjectContributorColumn::Contributions)
        .all(db)
        .await?)
}

/// Issues, newest number first.
pub async fn issues(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<ProjectIssueModel>> {
    Ok(ProjectIssue::find()
        .filter(ProjectIssueColumn::ProjectId.eq(project_id))
        .order_by_desc(ProjectIssueColumn::IssueNumber)
        .all(db)
        .await?)
}

/// Pull requests, newest number first.
pub async fn pull_requests(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<ProjectPullRequestModel>> {
    Ok(ProjectPullRequest::find()
        .filter(ProjectPullRequestColumn::ProjectId.eq(project_id))
        .order_by_desc(ProjectPullRequestColumn::PrNumber)
        .all(db)
        .await?)
}

/// Releases, most recently published first.
pub async fn releases(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<ProjectReleaseModel>> {
    Ok(ProjectRelease::find()
        .filter(ProjectReleaseColumn::ProjectId.eq(project_id))
        .order_by_desc(ProjectReleaseColumn::ReleasePublishedAt)
        .order_by_desc(ProjectReleaseColumn::ReleaseCreatedAt)
        .all(db)
        .await?)
}

/// Branches, default first, then by name.
pub async fn branches(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<ProjectBranchModel>> {
    Ok(ProjectBranch::find()
        .filter(ProjectBranchColumn::ProjectId.eq(project_id))
        .order_by_desc(ProjectBranchColumn::IsDefault)
        .order_by_asc(ProjectBranchColumn::Name)
        .all(db)
        .await?)
}

/// Languages by size, largest first.
pub async fn languages(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<ProjectLanguageModel>> {
    Ok(ProjectLanguage::find()
        .filter(ProjectLanguageColumn::ProjectId.eq(project_id))
        .order_by_desc(ProjectLanguageColumn::BytesCount)
        .all(db)
        .await?)
}

/// Dependencies by type, then name.
pub async fn dependencies(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<ProjectDependencyModel>> {
    Ok(ProjectDependency::find()
        .filter(ProjectDependencyColumn::ProjectId.eq(project_id))
        .order_by_asc(ProjectDependencyColumn::DepType)
        .order_by_asc(ProjectDependencyColumn::Name)
        .all(db)
        .await?)
}

/// Versions, highest semver first.
pub async fn versions(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<ProjectVersionModel>> {
    let mut versions = ProjectVersion::find()
        .filter(ProjectVersionColumn::ProjectId.eq(project_id))
        .all(db)
        .await?;
    versions.sort_by(|a, b| b.semver().cmp(&a.semver()));
    Ok(versions)
}

/// The version flagged as latest, if any.
pub async fn latest_version(db: &DatabaseConnection, project_id: Uuid) -> Result<Option<ProjectVersionModel>> {
    Ok(ProjectVersion::find()
        .filter(ProjectVersionColumn::ProjectId.eq(project_id))
        .filter(ProjectVersionColumn::IsLatest.eq(true))
        .one(db)
        .await?)
}
