//! Repository contract for [`Job`] records.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::model::Job;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("job not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Job, RepositoryError>;
    /// Full-row update of `status`, `result`, `updated_at`.
    async fn update(&self, job: &Job) -> Result<(), RepositoryError>;
    /// Jobs currently `running` — used by the startup recovery sweep.
    async fn list_running(&self) -> Result<Vec<Job>, RepositoryError>;
}
