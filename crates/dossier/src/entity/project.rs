//! Project entity - a documented codebase, optionally backed by a GitHub repo.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Naming ──────────────────────────────────────────────────────────────
    /// Unique display name; `owner/repo` for synced projects by default.
    #[sea_orm(unique)]
    pub name: String,
    /// `owner/repo` as reported by GitHub.
    pub full_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    // ─── Sources ─────────────────────────────────────────────────────────────
    pub repository_url: Option<String>,
    pub documentation_path: Option<String>,

    // ─── GitHub ──────────────────────────────────────────────────────────────
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_stars: Option<i32>,
    pub github_language: Option<String>,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    pub last_synced_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document_section::Entity")]
    DocumentSections,
    #[sea_orm(has_many = "super::project_contributor::Entity")]
    Contributors,
    #[sea_orm(has_many = "super::project_issue::Entity")]
    Issues,
    #[sea_orm(has_many = "super::project_language::Entity")]
    Languages,
    #[sea_orm(has_many = "super::project_branch::Entity")]
    Branches,
    #[sea_orm(has_many = "super::project_dependency::Entity")]
    Dependencies,
    #[sea_orm(has_many = "super::project_pull_request::Entity")]
    PullRequests,
    #[sea_orm(has_many = "super::project_release::Entity")]
    Releases,
    #[sea_orm(has_many = "super::project_version::Entity")]
    Versions,
    #[sea_orm(has_many = "super::project_delta::Entity")]
    Deltas,
}

impl Related<super::document_section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentSections.def()
    }
}

impl Related<super::project_contributor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributors.def()
    }
}

impl Related<super::project_issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issues.def()
    }
}

impl Related<super::project_language::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Languages.def()
    }
}

impl Related<super::project_branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branches.def()
    }
}

impl Related<super::project_dependency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dependencies.def()
    }
}

impl Related<super::project_pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequests.def()
    }
}

impl Related<super::project_release::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Releases.def()
    }
}

impl Related<super::project_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl Related<super::project_delta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deltas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// `(owner, repo)` from the path of a github.com URL.
fn split_github_url(url: &str) -> Option<(&str, Option<&str>)> {
    let url = url.trim_end_matches('/');
    let (_, path) = url.split_once("github.com/")?;
    let mut parts = path.split('/');
    let owner = parts.next().filter(|p| !p.is_empty())?;
    Some((owner, parts.next().filter(|p| !p.is_empty())))
}

impl Model {
    /// Best available `owner/repo` form, falling back to the name.
    pub fn full_name(&self) -> String {
        if let Some(full) = &self.full_name {
            return full.clone();
        }
        if let (Some(owner), Some(repo)) = (&self.github_owner, &self.github_repo) {
            return format!("{owner}/{repo}");
        }
        if let Some((owner, Some(repo))) =
            self.repository_url.as_deref().and_then(split_github_url)
        {
            return format!("{owner}/{repo}");
        }
        self.name.clone()
    }

    pub fn owner(&self) -> Option<String> {
        if let Some(owner) = &self.github_owner {
            return Some(owner.clone());
        }
        if let Some((owner, _)) = self.full_name.as_deref().and_then(|f| f.split_once('/')) {
            return Some(owner.to_string());
        }
        if let Some((owner, _)) = self.repository_url.as_deref().and_then(split_github_url) {
            return Some(owner.to_string());
        }
        self.name.split_once('/').map(|(owner, _)| owner.to_string())
    }

    pub fn repo(&self) -> String {
        if let Some(repo) = &self.github_repo {
            return repo.clone();
        }
        if let Some((_, repo)) = self.full_name.as_deref().and_then(|f| f.rsplit_once('/')) {
            return repo.to_string();
        }
        if let Some((_, Some(repo))) = self.repository_url.as_deref().and_then(split_github_url) {
            return repo.to_string();
        }
        match self.name.rsplit_once('/') {
            Some((_, repo)) => repo.to_string(),
            None => self.name.clone(),
        }
    }

    /// Repository URL, or one derived from the GitHub coordinates.
    pub fn github_url(&self) -> Option<String> {
        if let Some(url) = &self.repository_url {
            return Some(url.trim_end_matches('/').to_string());
        }
        if let (Some(owner), Some(repo)) = (&self.github_owner, &self.github_repo) {
            return Some(format!("https://github.com/{owner}/{repo}"));
        }
        if let Some(full) = self.full_name.as_deref().filter(|f| f.contains('/')) {
            return Some(format!("https://github.com/{full}"));
        }
        if self.name.contains('/') {
            return Some(format!("https://github.com/{}", self.name));
        }
        None
    }

    pub fn issues_url(&self, number: Option<i64>) -> Option<String> {
        let base = self.github_url()?;
        Some(match number {
            Some(n) => format!("{base}/issues/{n}"),
            None => format!("{base}/issues"),
        })
    }

    pub fn pulls_url(&self, number: Option<i64>) -> Option<String> {
        let base = self.github_url()?;
        Some(match number {
            Some(n) => format!("{base}/pull/{n}"),
            None => format!("{base}/pulls"),
        })
    }

    pub fn branch_url(&self, branch: &str) -> Option<String> {
        Some(format!("{}/tree/{branch}", self.github_url()?))
    }

    pub fn releases_url(&self, tag: Option<&str>) -> Option<String> {
        let base = self.github_url()?;
        Some(match tag {
            Some(tag) => format!("{base}/releases/tag/{tag}"),
            None => format!("{base}/releases"),
        })
    }

    /// Changes between two tags.
    pub fn compare_url(&self, from: &str, to: &str) -> Option<String> {
        Some(format!("{}/compare/{from}...{to}", self.github_url()?))
    }

    /// Whether the project was linked to a GitHub repository by a sync.
    pub fn is_synced(&self) -> bool {
        self.last_synced_at.is_some()
    }
}
