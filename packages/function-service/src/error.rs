use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domains::function::RepositoryError as FnRepoError;
use crate::domains::job::RepositoryError as JobRepoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<FnRepoError> for AppError {
    fn from(err: FnRepoError) -> Self {
        match err {
            FnRepoError::NotFound => AppError::NotFound,
            FnRepoError::Persistence(e) => AppError::Persistence(e.to_string()),
        }
    }
}

impl From<JobRepoError> for AppError {
    fn from(err: JobRepoError) -> Self {
        match err {
            JobRepoError::NotFound => AppError::NotFound,
            JobRepoError::Persistence(e) => AppError::Persistence(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
