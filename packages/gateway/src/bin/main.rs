use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use gateway_core::middleware::admission::RedisAdmission;
use gateway_core::server::{router, AppState};
use gateway_core::Config;
use redis::aio::ConnectionManager;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gateway_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    tracing::info!(url = %config.redis_url, "connecting to redis");
    let redis_client =
        redis::Client::open(config.redis_url.clone()).context("invalid REDIS_URL")?;
    let redis_conn = ConnectionManager::new(redis_client)
        .await
        .context("failed to connect to redis")?;

    let admission: Arc<dyn gateway_core::middleware::admission::AdmissionBackend> =
        Arc::new(RedisAdmission::new(
            redis_conn,
            config.concurrency_limit,
            config.concurrency_ttl_secs,
            config.rate_limit_algo,
            config.rate_limit_r,
            config.rate_limit_window_secs,
        ));

    let state = AppState::new(config.auth_service_url.clone(), config.function_service_url.clone());
    let jwt_secret: Arc<str> = Arc::from(config.jwt_secret.as_str());

    let app = router(state, admission, jwt_secret).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, "starting gateway");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind listener")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
