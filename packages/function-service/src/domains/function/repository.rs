//! Repository contract for [`Function`] records.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::model::Function;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("function not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// Narrow capability set consumed by the executor and the HTTP surface.
///
/// Kept as a trait object (`Arc<dyn FunctionRepository>`) rather than a
/// concrete type so tests can substitute an in-memory store without
/// touching callers, the same shape the teacher uses for its job store
/// traits.
#[async_trait]
pub trait FunctionRepository: Send + Sync {
    async fn create(&self, function: &Function) -> Result<(), RepositoryError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Function, RepositoryError>;
    /// Ordered by `created_at` descending.
    async fn list(&self) -> Result<Vec<Function>, RepositoryError>;
}
