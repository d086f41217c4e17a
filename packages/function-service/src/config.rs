use anyhow::{Context, Result};
use std::env;

/// Configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub executor_workers: usize,
    pub job_deadline_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: env::var("FUNCTION_DB_DSN").context("FUNCTION_DB_DSN must be set")?,
            port: env::var("FUNCTION_SERVICE_PORT")
                .unwrap_or_else(|_| "8082".to_string())
                .parse()
                .context("FUNCTION_SERVICE_PORT must be a valid number")?,
            executor_workers: env::var("EXECUTOR_WORKERS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("EXECUTOR_WORKERS must be a valid number")?,
            job_deadline_secs: env::var("JOB_DEADLINE_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("JOB_DEADLINE_SECS must be a valid number")?,
        })
    }
}
