use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Project not found: {name}")]
    ProjectNotFound { name: String },

    #[error("Project already exists: {name}")]
    DuplicateProject { name: String },

    #[error("{child} is already a component of {parent}")]
    ComponentExists { parent: String, child: String },

    #[error("{child} is not a component of {parent}")]
    ComponentNotFound { parent: String, child: String },

    #[error("A project cannot be a component of itself: {name}")]
    SelfReference { name: String },

    #[error("Delta not found: {project}/{name}")]
    DeltaNotFound { project: String, name: String },

    #[error("Delta already exists: {project}/{name}")]
    DuplicateDelta { project: String, name: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    pub fn project_not_found(name: impl Into<String>) -> Self {
        Self::ProjectNotFound { name: name.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. }
                | Self::ComponentNotFound { .. }
                | Self::DeltaNotFound { .. }
        )
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateProject { .. }
                | Self::ComponentExists { .. }
                | Self::DuplicateDelta { .. }
        )
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
