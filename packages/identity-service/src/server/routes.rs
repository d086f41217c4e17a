use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domains::user::{RefreshToken, User, UserRepository};
use crate::error::AppError;
use crate::jwt::{self, TokenPair};

#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<dyn UserRepository>,
    pub jwt_secret: Arc<str>,
    pub jwt_issuer: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .with_state(state)
}

async fn health() -> &'static str {
    "Identity service healthy\n"
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<Value>), AppError> {
    if req.email.trim().is_empty() || req.password.len() < 8 {
        return Err(AppError::Validation(
            "email must be non-empty and password must be at least 8 characters".into(),
        ));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Persistence(e.to_string()))?;
    let user = User::new(req.email, password_hash);
    state.user_repo.create(&user).await?;

    Ok((
        axum::http::StatusCode::OK,
        Json(json!({ "status": "registered" })),
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = state
        .user_repo
        .get_by_email(&req.email)
        .await
        .map_err(|_| AppError::Unauthorized)?;

    let valid = bcrypt::verify(&req.password, &user.password_hash).unwrap_or(false);
    if !valid {
        return Err(AppError::Unauthorized);
    }

    let pair = issue_token_pair(&state, &user).await?;
    Ok(Json(pair.into()))
}

#[derive(Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let stored = state
        .user_repo
        .get_refresh_token(&req.refresh_token)
        .await
        .map_err(|_| AppError::Unauthorized)?;

    if stored.is_expired() {
        return Err(AppError::Unauthorized);
    }

    // Roles are re-derived from the stored user record, not hardcoded —
    // see DESIGN.md for why the original's hardcoded `{user}` reissue was
    // not carried forward.
    let user = state.user_repo.get_by_id(stored.user_id).await?;

    let pair = issue_token_pair(&state, &user).await?;
    Ok(Json(pair.into()))
}

async fn issue_token_pair(state: &AppState, user: &User) -> Result<TokenPair, AppError> {
    let access_token = jwt::issue_access_token(
        user.id,
        &user.roles,
        &state.jwt_secret,
        &state.jwt_issuer,
    )
    .map_err(|e| AppError::Persistence(e.to_string()))?;

    let refresh_token = jwt::generate_refresh_token();
    let record = RefreshToken::new(user.id, refresh_token.clone(), jwt::refresh_token_ttl());
    state.user_repo.store_refresh_token(&record).await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}
