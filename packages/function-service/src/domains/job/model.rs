//! Job model — one execution attempt of a stored function.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub function_id: Uuid,
    pub status: JobStatus,
    pub result: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(function_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            function_id,
            status: JobStatus::Queued,
            result: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
        self.updated_at = Utc::now();
    }

    pub fn mark_done(&mut self, result: String) {
        self.status = JobStatus::Done;
        self.result = result;
        self.updated_at = Utc::now();
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.result = message.into();
        self.updated_at = Utc::now();
    }
}
