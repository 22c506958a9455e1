use thiserror::Error;

use crate::github::GitHubError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::GitHub(e) if e.is_rate_limited())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
