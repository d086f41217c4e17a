use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::Function;
use super::repository::{FunctionRepository, RepositoryError};

pub struct PostgresFunctionRepository {
    pool: PgPool,
}

impl PostgresFunctionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FunctionRepository for PostgresFunctionRepository {
    async fn create(&self, function: &Function) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO functions (id, owner, code, language, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(function.id)
        .bind(&function.owner)
        .bind(&function.code)
        .bind(&function.language)
        .bind(function.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Function, RepositoryError> {
        sqlx::query_as::<_, Function>(
            r#"
            SELECT id, owner, code, language, created_at
              FROM functions
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Function>, RepositoryError> {
        let functions = sqlx::query_as::<_, Function>(
            r#"
            SELECT id, owner, code, language, created_at
              FROM functions
             ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(functions)
    }
}
