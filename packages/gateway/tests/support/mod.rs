//! Fake admission backend and a tiny stub upstream server for gateway
//! integration tests, so tests never touch a real Redis or downstream
//! service.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::routing::{any, get};
use axum::{Json, Router};
use gateway_core::error::AppError;
use gateway_core::middleware::admission::AdmissionBackend;
use serde_json::json;

/// Always allows unless told to deny, so tests can exercise the 429 path
/// deterministically without a real rate-limit window.
pub struct FakeAdmission {
    pub deny: AtomicBool,
}

impl Default for FakeAdmission {
    fn default() -> Self {
        Self {
            deny: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AdmissionBackend for FakeAdmission {
    async fn check_rate_limit(&self, _principal: &str) -> Result<bool, AppError> {
        Ok(!self.deny.load(Ordering::SeqCst))
    }

    async fn acquire_concurrency_slot(&self, _principal: &str) -> Result<bool, AppError> {
        Ok(!self.deny.load(Ordering::SeqCst))
    }

    async fn release_concurrency_slot(&self, _principal: &str) {}
}

/// Spawns an in-process stub upstream that echoes the request path/query
/// back as JSON, standing in for the identity/function services.
pub async fn spawn_stub_upstream() -> String {
    let app = Router::new().route("/*rest", any(echo)).route("/", any(echo));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn echo(req: axum::extract::Request) -> Json<serde_json::Value> {
    Json(json!({
        "path": req.uri().path(),
        "query": req.uri().query(),
    }))
}
