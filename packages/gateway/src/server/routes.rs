use std::sync::Arc;

use axum::routing::{any, get, post};
use axum::{middleware, Router};
use reqwest::Client;

use crate::forward::{auth_client, forward_to_auth_service, forward_to_function_service, function_client};
use crate::middleware::admission::{admission_middleware, AdmissionBackend, AdmissionState};
use crate::middleware::auth::{require_admin, require_auth};
use crate::middleware::ip_extractor::extract_client_ip;

#[derive(Clone)]
pub struct AppState {
    pub auth_client: Client,
    pub function_client: Client,
    pub auth_service_url: Arc<str>,
    pub function_service_url: Arc<str>,
}

impl AppState {
    pub fn new(auth_service_url: String, function_service_url: String) -> Self {
        Self {
            auth_client: auth_client(),
            function_client: function_client(),
            auth_service_url: Arc::from(auth_service_url.as_str()),
            function_service_url: Arc::from(function_service_url.as_str()),
        }
    }
}

async fn health() -> &'static str {
    "API Gateway is healthy\n"
}

pub fn router(state: AppState, admission: Arc<dyn AdmissionBackend>, jwt_secret: Arc<str>) -> Router {
    let admission_state = AdmissionState {
        backend: admission,
        jwt_secret: jwt_secret.clone(),
    };

    let public = Router::new()
        .route("/register", post(forward_to_auth_service))
        .route("/login", post(forward_to_auth_service))
        .route("/refresh", post(forward_to_auth_service))
        .layer(middleware::from_fn_with_state(
            admission_state.clone(),
            admission_middleware,
        ))
        .with_state(state.clone());

    let admin = Router::new()
        .route("/dashboard", get(admin_dashboard))
        .layer(middleware::from_fn(require_admin));

    // Admission (rate limit + concurrency) must admit every request before
    // auth rejects it, or unauthenticated traffic floods past the limiter
    // entirely. `require_auth` is layered first so it sits innermost and
    // `admission_middleware` wraps it, running first on the way in.
    let protected = Router::new()
        .route("/functions", any(forward_to_function_service))
        .route("/functions/*rest", any(forward_to_function_service))
        .route("/jobs", any(forward_to_function_service))
        .route("/jobs/*rest", any(forward_to_function_service))
        .nest("/admin", admin)
        .layer(middleware::from_fn_with_state(jwt_secret, require_auth))
        .layer(middleware::from_fn_with_state(
            admission_state,
            admission_middleware,
        ))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .nest("/auth", public)
        .merge(protected)
        .layer(middleware::from_fn(extract_client_ip))
}

async fn admin_dashboard() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "dashboard": "admin metrics" }))
}
