//! Function model — an immutable record of user-submitted source code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Function {
    pub id: Uuid,
    pub owner: String,
    pub code: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl Function {
    pub fn new(owner: String, code: String, language: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            code,
            language: language.trim().to_lowercase(),
            created_at: Utc::now(),
        }
    }
}
