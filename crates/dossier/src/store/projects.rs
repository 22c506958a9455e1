use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::project::{ActiveModel, Column, Entity as Project, Model};
use crate::github::GitHubRepo;

use super::errors::{Result, StoreError};

// ─── Single Record Operations ────────────────────────────────────────────────

/// Fields for a new, locally registered project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub documentation_path: Option<String>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Insert a project.
///
/// # Errors
/// Returns `StoreError::DuplicateProject` if the name is taken.
pub async fn create(db: &DatabaseConnection, project: NewProject) -> Result<Model> {
    let name = project.name.trim().to_string();
    if name.is_empty() {
        return Err(StoreError::invalid("project name must not be empty"));
    }
    if find_by_name(db, &name).await?.is_some() {
        return Err(StoreError::DuplicateProject { name });
    }

    let now = Utc::now().fixed_offset();
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        full_name: Set(None),
        description: Set(project.description),
        repository_url: Set(project.repository_url),
        documentation_path: Set(project.documentation_path),
        github_owner: Set(None),
        github_repo: Set(None),
        github_stars: Set(None),
        github_language: Set(None),
        last_synced_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?)
}

/// A project that stands for something a repository refers to: a
/// language, a package, a contributor, or one of its issues or branches.
#[derive(Debug, Clone, Default)]
pub struct EntityProject {
    pub name: String,
    pub description: String,
    pub repository_url: Option<String>,
    pub documentation_path: Option<String>,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_language: Option<String>,
}

/// The project named `entity.name`, created from `entity` when missing.
/// The flag is `true` when the project was created.
pub async fn find_or_create_entity(db: &DatabaseConnection, entity: EntityProject) -> Result<(Model, bool)> {
    if let Some(existing) = find_by_name(db, &entity.name).await? {
        return Ok((existing, false));
    }

    let now = Utc::now().fixed_offset();
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(entity.name),
        full_name: Set(None),
        description: Set(Some(entity.description)),
        repository_url: Set(entity.repository_url),
        documentation_path: Set(entity.documentation_path),
        github_owner: Set(entity.github_owner),
        github_repo: Set(entity.github_repo),
        github_stars: Set(None),
        github_language: Set(entity.github_language),
        last_synced_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok((model.insert(db).await?, true))
}

/// Projects whose name contains `pattern`, ignoring case.
pub async fn matching(db: &DatabaseConnection, pattern: &str) -> Result<Vec<Model>> {
    let needle = pattern.to_lowercase();
    Ok(list(db)
        .await?
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect())
}

pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Model>> {
    Ok(Project::find()
        .filter(Column::Name.eq(name))
        .one(db)
        .await?)
}

/// Like [`find_by_name`], with a missing project as an error.
pub async fn get_by_name(db: &DatabaseConnection, name: &str) -> Result<Model> {
    find_by_name(db, name)
        .await?
        .ok_or_else(|| StoreError::project_not_found(name))
}

pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>> {
    Ok(Project::find_by_id(id).one(db).await?)
}

/// Every project, ordered by name.
pub async fn list(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Project::find().order_by_asc(Column::Name).all(db).await?)
}

/// Projects that have been synced from GitHub, most recent first.
pub async fn list_synced(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Project::find()
        .filter(Column::LastSyncedAt.is_not_null())
        .order_by_desc(Column::LastSyncedAt)
        .all(db)
        .await?)
}

/// Rename a project.
///
/// # Errors
/// `ProjectNotFound` if `old` is missing, `DuplicateProject` if `new` is taken.
pub async fn rename(db: &DatabaseConnection, old: &str, new: &str) -> Result<Model> {
    let new = new.trim();
    if new.is_empty() {
        return Err(StoreError::invalid("project name must not be empty"));
    }
    let project = get_by_name(db, old).await?;
    if old != new && find_by_name(db, new).await?.is_some() {
        return Err(StoreError::DuplicateProject {
            name: new.to_string(),
        });
    }

    let mut active = project.into_active_model();
    active.name = Set(new.to_string());
    active.updated_at = Set(Utc::now().fixed_offset());
    Ok(active.update(db).await?)
}

/// Delete a project by name. Sections, component links and GitHub
/// metadata go with it.
///
/// Returns `false` when no such project exists.
pub async fn remove(db: &DatabaseConnection, name: &str) -> Result<bool> {
    let result = Project::delete_many()
        .filter(Column::Name.eq(name))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn count(db: &DatabaseConnection) -> Result<u64> {
    Ok(Project::find().count(db).await?)
}

/// Create or refresh the project `name` from GitHub metadata and stamp it
/// as synced now.
///
/// `description` overrides the repository description when given.
pub async fn upsert_synced(
    db: &DatabaseConnection,
    name: &str,
    repo: &GitHubRepo,
    description: Option<String>,
) -> Result<Model> {
    let now = Utc::now().fixed_offset();
    let description = description.or_else(|| repo.description.clone());
    let stars = i32::try_from(repo.stars).unwrap_or(i32::MAX);

    match find_by_name(db, name).await? {
        Some(existing) => {
            let mut active = existing.into_active_model();
            active.full_name = Set(Some(repo.full_name.clone()));
            active.description = Set(description);
            active.repository_url = Set(Some(repo.html_url.clone()));
            active.github_owner = Set(Some(repo.owner.clone()));
            active.github_repo = Set(Some(repo.name.clone()));
            active.github_stars = Set(Some(stars));
            active.github_language = Set(repo.language.clone());
            active.last_synced_at = Set(Some(now));
            active.updated_at = Set(now);
            Ok(active.update(db).await?)
        }
        None => {
            let model = ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                full_name: Set(Some(repo.full_name.clone())),
                description: Set(description),
                repository_url: Set(Some(repo.html_url.clone())),
                documentation_path: Set(None),
                github_owner: Set(Some(repo.owner.clone())),
                github_repo: Set(Some(repo.name.clone())),
                github_stars: Set(Some(stars)),
                github_language: Set(repo.language.clone()),
                last_synced_at: Set(Some(now)),
                created_at: Set(now),
                updated_at: Set(now),
            };
            Ok(model.insert(db).await?)
        }
    }
}
