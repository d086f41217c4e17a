use std::sync::Arc;

use anyhow::{Context, Result};
use identity_core::domains::user::PostgresUserRepository;
use identity_core::server::{router, AppState};
use identity_core::Config;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,identity_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    tracing::info!("connecting to identity database");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let user_repo = Arc::new(PostgresUserRepository::new(pool));

    let state = AppState {
        user_repo,
        jwt_secret: Arc::from(config.jwt_secret.as_str()),
        jwt_issuer: Arc::from(config.jwt_issuer.as_str()),
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, "starting identity service");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
