use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{RefreshToken, User};
use super::repository::{RepositoryError, UserRepository};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, roles, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict
            }
            _ => RepositoryError::Persistence(err),
        })?;
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, roles, created_at
              FROM users
             WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, roles, created_at
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
                SET token = EXCLUDED.token, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(token.user_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<RefreshToken, RepositoryError> {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT user_id, token, expires_at
              FROM refresh_tokens
             WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
