mod model;
mod postgres_repository;
mod repository;

pub use model::{RefreshToken, User};
pub use postgres_repository::PostgresUserRepository;
pub use repository::{RepositoryError, UserRepository};
