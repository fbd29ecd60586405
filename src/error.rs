use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures raised by the SQLite layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("malformed stored JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MissingParameter(String),
    #[error("{0}")]
    InvalidParameter(String),
    #[error("Invalid page.")]
    InvalidPage,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidParameter(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingParameter(msg) | AppError::InvalidParameter(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::InvalidPage => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Storage(err) => {
                tracing::error!(error = %err, "storage failure while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Task(err) => {
                tracing::error!(error = %err, "blocking query task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_is_bad_request() {
        let response = AppError::MissingParameter("'customer_org_id' is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_page_is_not_found() {
        assert_eq!(AppError::InvalidPage.to_string(), "Invalid page.");
        assert_eq!(AppError::InvalidPage.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_error_is_server_error() {
        let err: AppError = StorageError::Poisoned.into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
