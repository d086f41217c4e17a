use std::sync::Arc;

use anyhow::{Context, Result};
use function_core::domains::function::PostgresFunctionRepository;
use function_core::domains::job::PostgresJobRepository;
use function_core::executor::{DockerRunner, Executor};
use function_core::server::{router, AppState};
use function_core::Config;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,function_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    tracing::info!("connecting to function database");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let function_repo = Arc::new(PostgresFunctionRepository::new(pool.clone()));
    let job_repo = Arc::new(PostgresJobRepository::new(pool));

    let runner = Arc::new(
        DockerRunner::new(config.job_deadline_secs)
            .context("failed to initialize Docker runner")?,
    );

    let executor = Arc::new(Executor::new(
        job_repo.clone(),
        function_repo.clone(),
        runner,
        config.executor_workers,
    ));

    let recovered = executor
        .recover_stranded_jobs()
        .await
        .context("failed to sweep stranded jobs")?;
    if recovered > 0 {
        tracing::warn!(recovered, "marked stranded running jobs as error on startup");
    }

    executor.start();

    let state = AppState {
        function_repo,
        job_repo,
        executor: executor.clone(),
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, "starting function service");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    executor.stop();
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
