use anyhow::{Context, Result};
use std::env;

use crate::middleware::admission::RateLimitAlgo;

/// Configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub auth_service_url: String,
    pub function_service_url: String,
    pub redis_url: String,
    pub rate_limit_algo: RateLimitAlgo,
    pub rate_limit_r: u32,
    pub rate_limit_window_secs: u32,
    pub concurrency_limit: u32,
    pub concurrency_ttl_secs: u32,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            port: env::var("GATEWAY_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("GATEWAY_PORT must be a valid number")?,
            auth_service_url: env::var("AUTH_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            function_service_url: env::var("FUNCTION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            rate_limit_algo: RateLimitAlgo::parse(
                &env::var("RATE_LIMIT_ALGO").unwrap_or_else(|_| "token-bucket".to_string()),
            ),
            rate_limit_r: env::var("RATE_LIMIT_R")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("RATE_LIMIT_R must be a valid number")?,
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("RATE_LIMIT_WINDOW_SECS must be a valid number")?,
            concurrency_limit: env::var("CONCURRENCY_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("CONCURRENCY_LIMIT must be a valid number")?,
            concurrency_ttl_secs: env::var("CONCURRENCY_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("CONCURRENCY_TTL_SECS must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
        })
    }
}
