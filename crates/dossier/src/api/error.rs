use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::report::ReportError;
use crate::store::StoreError;

/// Errors returned by handlers, rendered as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn project_not_found() -> Self {
        Self::NotFound("Project not found".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => {
                tracing::error!(error = %e, "database error");
                Self::Internal(e.to_string())
            }
            e if e.is_not_found() => Self::NotFound(e.to_string()),
            e if e.is_conflict() => Self::Conflict(e.to_string()),
            e => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Store(e) => e.into(),
            e @ ReportError::Invalid { .. } => Self::BadRequest(e.to_string()),
            e @ (ReportError::Yaml(_) | ReportError::Json(_)) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::project_not_found("x"), StatusCode::NOT_FOUND),
            (
                StoreError::DuplicateProject { name: "x".into() },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::ComponentExists {
                    parent: "a".into(),
                    child: "b".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::SelfReference { name: "a".into() },
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::Database(sea_orm::DbErr::Custom("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
