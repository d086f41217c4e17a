use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{Job, JobStatus};
use super::repository::{JobRepository, RepositoryError};

pub struct PostgresJobRepository {
    pool: PgPool,
}

impl PostgresJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, function_id, status, result, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(job.id)
        .bind(job.function_id)
        .bind(job.status)
        .bind(&job.result)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Job, RepositoryError> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, function_id, status, result, created_at, updated_at
              FROM jobs
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE jobs
               SET status = $1,
                   result = $2,
                   updated_at = $3
             WHERE id = $4
            "#,
        )
        .bind(job.status)
        .bind(&job.result)
        .bind(job.updated_at)
        .bind(job.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_running(&self) -> Result<Vec<Job>, RepositoryError> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, function_id, status, result, created_at, updated_at
              FROM jobs
             WHERE status = $1
            "#,
        )
        .bind(JobStatus::Running)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }
}
