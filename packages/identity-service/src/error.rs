use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domains::user::RepositoryError as UserRepoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid email or password")]
    Unauthorized,
    #[error("email already registered")]
    Conflict,
    #[error("not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<UserRepoError> for AppError {
    fn from(err: UserRepoError) -> Self {
        match err {
            UserRepoError::NotFound => AppError::NotFound,
            UserRepoError::Conflict => AppError::Conflict,
            UserRepoError::Persistence(e) => AppError::Persistence(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
