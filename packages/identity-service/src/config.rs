use anyhow::{Context, Result};
use std::env;

/// Configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: env::var("IDENTITY_DB_DSN").context("IDENTITY_DB_DSN must be set")?,
            port: env::var("AUTH_PORT")
                .unwrap_or_else(|_| "8081".to_string())
                .parse()
                .context("AUTH_PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "platform-identity".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_port_and_issuer_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("IDENTITY_DB_DSN", "postgres://localhost/test");
        env::set_var("JWT_SECRET", "s3cr3t");
        env::remove_var("AUTH_PORT");
        env::remove_var("JWT_ISSUER");

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.jwt_issuer, "platform-identity");
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("IDENTITY_DB_DSN", "postgres://localhost/test");
        env::remove_var("JWT_SECRET");
        assert!(Config::from_env().is_err());
    }
}
