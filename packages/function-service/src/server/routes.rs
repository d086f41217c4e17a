use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domains::function::{Function, FunctionRepository};
use crate::domains::job::{Job, JobRepository};
use crate::error::AppError;
use crate::executor::{ExecRequest, Executor};

#[derive(Clone)]
pub struct AppState {
    pub function_repo: Arc<dyn FunctionRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub executor: Arc<Executor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/functions", post(create_function).get(list_functions))
        .route("/functions/:id/execute", post(execute_function))
        .route("/jobs/:id", get(get_job))
        .with_state(state)
}

async fn health() -> &'static str {
    "Function service healthy\n"
}

#[derive(Deserialize)]
struct CreateFunctionRequest {
    owner: String,
    code: String,
    language: String,
}

async fn create_function(
    State(state): State<AppState>,
    Json(req): Json<CreateFunctionRequest>,
) -> Result<(axum::http::StatusCode, Json<Value>), AppError> {
    let function = Function::new(req.owner, req.code, req.language);
    state.function_repo.create(&function).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(json!({ "function_id": function.id, "status": "created" })),
    ))
}

async fn list_functions(State(state): State<AppState>) -> Result<Json<Vec<Function>>, AppError> {
    let functions = state.function_repo.list().await?;
    Ok(Json(functions))
}

#[derive(Serialize)]
struct ExecuteResponse {
    job_id: Uuid,
    status: &'static str,
}

async fn execute_function(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(axum::http::StatusCode, Json<ExecuteResponse>), AppError> {
    let function_id =
        Uuid::parse_str(&id).map_err(|_| AppError::Validation("invalid function ID".into()))?;

    let job = Job::new(function_id);
    state.job_repo.create(&job).await?;

    state.executor.enqueue(ExecRequest {
        job_id: job.id,
        function_id,
    }).await;

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(ExecuteResponse {
            job_id: job.id,
            status: "queued",
        }),
    ))
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let job_id = Uuid::parse_str(&id).map_err(|_| AppError::Validation("invalid job ID".into()))?;
    let job = state.job_repo.get_by_id(job_id).await?;
    Ok(Json(job))
}
