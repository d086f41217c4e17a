use async_trait::async_trait;
use uuid::Uuid;

use super::model::{RefreshToken, User};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("resource not found")]
    NotFound,
    #[error("email already registered")]
    Conflict,
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), RepositoryError>;
    async fn get_by_email(&self, email: &str) -> Result<User, RepositoryError>;
    async fn get_by_id(&self, id: Uuid) -> Result<User, RepositoryError>;
    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<(), RepositoryError>;
    async fn get_refresh_token(&self, token: &str) -> Result<RefreshToken, RepositoryError>;
}
