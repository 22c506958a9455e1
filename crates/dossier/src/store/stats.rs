use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;

use crate::entity::prelude::*;

use super::errors::Result;

/// Row counts across the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub projects: u64,
    pub synced_projects: u64,
    pub sections: u64,
    pub components: u64,
    pub contributors: u64,
    pub issues: u64,
    pub pull_requests: u64,
    pub releases: u64,
    pub branches: u64,
    pub languages: u64,
    pub dependencies: u64,
    pub versions: u64,
    pub deltas: u64,
    /// `(name, last_synced_at)` of the most recently synced projects.
    pub recently_synced: Vec<(String, String)>,
}

/// What [`clear`] deletes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearScope {
    pub sections: bool,
    pub components: bool,
    /// Deleting projects also deletes everything attached to them.
    pub projects: bool,
}

impl ClearScope {
    pub fn all() -> Self {
        Self {
            sections: true,
            components: true,
            projects: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.sections || self.components || self.projects)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearCounts {
    pub sections: u64,
    pub components: u64,
    pub projects: u64,
}

pub async fn collect(db: &DatabaseConnection, recent: u64) -> Result<DatabaseStats> {
    let recently_synced = Project::find()
        .filter(ProjectColumn::LastSyncedAt.is_not_null())
        .order_by_desc(ProjectColumn::LastSyncedAt)
        .limit(recent)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|p| Some((p.name, p.last_synced_at?.to_rfc3339())))
        .collect();

    Ok(DatabaseStats {
        projects: Project::find().count(db).await?,
        synced_projects: Project::find()
            .filter(ProjectColumn::LastSyncedAt.is_not_null())
            .count(db)
            .await?,
        sections: DocumentSection::find().count(db).await?,
        components: ProjectComponent::find().count(db).await?,
        contributors: ProjectContributor::find().count(db).await?,
        issues: ProjectIssue::find().count(db).await?,
        pull_requests: ProjectPullRequest::find().count(db).await?,
        releases: ProjectRelease::find().count(db).await?,
        branches: ProjectBranch::find().count(db).await?,
        languages: ProjectLanguage::find().count(db).await?,
        dependencies: ProjectDependency::find().count(db).await?,
        versions: ProjectVersion::find().count(db).await?,
        deltas: ProjectDelta::find().count(db).await?,
        recently_synced,
    })
}

/// Delete the selected tables' rows. Counts for projects include only the
/// project rows themselves.
pub async fn clear(db: &DatabaseConnection, scope: ClearScope) -> Result<ClearCounts> {
    let mut counts = ClearCounts::default();
    if scope.sections {
        counts.sections = DocumentSection::delete_many().exec(db).await?.rows_affected;
    }
    if scope.components {
        counts.components = ProjectComponent::delete_many().exec(db).await?.rows_affected;
    }
    if scope.projects {
        counts.projects = Project::delete_many().exec(db).await?.rows_affected;
    }
    Ok(counts)
}
