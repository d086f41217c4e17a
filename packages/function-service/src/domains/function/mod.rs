mod model;
mod postgres_repository;
mod repository;

pub use model::Function;
pub use postgres_repository::PostgresFunctionRepository;
pub use repository::{FunctionRepository, RepositoryError};
