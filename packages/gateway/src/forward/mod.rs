//! Reverse-proxy forwarding to the identity and function services.
//! Mirrors the original gateway's per-hop client and header passthrough.

use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use reqwest::Client;

use crate::error::AppError;
use crate::server::AppState;

pub fn auth_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build auth HTTP client")
}

pub fn function_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .expect("failed to build function HTTP client")
}

/// Forwards to the identity service. `Router::nest("/auth", ...)` has
/// already stripped the `/auth` prefix from the request's path by the
/// time it reaches here.
pub async fn forward_to_auth_service(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    forward(&state.auth_client, &state.auth_service_url, &path, request).await
}

/// Forwards to the function service, preserving the request path as-is.
pub async fn forward_to_function_service(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    forward(&state.function_client, &state.function_service_url, &path, request).await
}

async fn forward(
    client: &Client,
    base_url: &str,
    path: &str,
    request: Request,
) -> Result<Response, AppError> {
    let method = request.method().clone();
    let headers = request.headers().clone();
    let query = request.uri().query().map(str::to_string);

    let body_bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut target = format!("{base_url}{path}");
    if let Some(query) = query {
        target.push('?');
        target.push_str(&query);
    }

    tracing::info!(%target, "forwarding request");

    let reqwest_method =
        reqwest::Method::from_bytes(method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET);

    let upstream_response = client
        .request(reqwest_method, &target)
        .headers(convert_headers(&headers))
        .body(body_bytes)
        .send()
        .await
        .map_err(|_| AppError::UpstreamUnreachable)?;

    let status = StatusCode::from_u16(upstream_response.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let response_headers = upstream_response.headers().clone();
    let body = upstream_response
        .bytes()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut builder = Response::builder().status(status);
    for (name, value) in response_headers.iter() {
        builder = builder.header(name, value);
    }
    builder
        .body(Body::from(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn convert_headers(headers: &HeaderMap) -> reqwest::header::HeaderMap {
    let mut converted = reqwest::header::HeaderMap::new();
    for (name, value) in headers.iter() {
        if name == axum::http::header::HOST {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes()),
            reqwest::header::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            converted.insert(name, value);
        }
    }
    converted
}
