//! Bearer-token verification. Unlike the teacher's optional-auth pattern,
//! the gateway's protected routes require a valid token — missing or
//! invalid tokens fail the request rather than continuing anonymously.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    roles: Vec<String>,
    exp: usize,
    iat: usize,
    iss: String,
}

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub principal: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

pub async fn require_auth(
    State(jwt_secret): State<Arc<str>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = extract_auth_user(&request, &jwt_secret).ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

pub(crate) fn extract_auth_user(request: &Request, jwt_secret: &str) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?
    .claims;

    Some(AuthUser {
        principal: claims.sub,
        roles: claims.roles,
    })
}

/// Rejects the request unless the authenticated user carries the `admin`
/// role. Must run after [`require_auth`] has populated the `AuthUser`
/// extension.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;
    if !user.has_role("admin") {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}
