//! Concurrency and rate limiting backed by a shared Redis store. Both
//! checks run as a single atomic Lua script per call — a naive
//! check-then-increment across two round trips would let concurrent
//! callers race past the limit.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use redis::aio::ConnectionManager;
use redis::Script;

use crate::error::AppError;
use crate::middleware::auth::extract_auth_user;
use crate::middleware::ip_extractor::ClientIp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitAlgo {
    TokenBucket,
    FixedWindow,
}

impl RateLimitAlgo {
    pub fn parse(s: &str) -> Self {
        match s {
            "fixed-window" => RateLimitAlgo::FixedWindow,
            _ => RateLimitAlgo::TokenBucket,
        }
    }
}

const CONCURRENCY_ACQUIRE_SCRIPT: &str = r#"
local key = KEYS[1]
local limit = tonumber(ARGV[1])
local ttl = tonumber(ARGV[2])
local current = tonumber(redis.call('GET', key) or '0')
if current >= limit then
    return 0
end
redis.call('INCR', key)
redis.call('EXPIRE', key, ttl)
return 1
"#;

const FIXED_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local current = redis.call('INCR', key)
if current == 1 then
    redis.call('EXPIRE', key, window)
end
if current > limit then
    return 0
end
return 1
"#;

const TOKEN_BUCKET_SCRIPT: &str = r#"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local refill_rate = tonumber(ARGV[2])

local time = redis.call('TIME')
local now = tonumber(time[1]) + (tonumber(time[2]) / 1000000)

local bucket = redis.call('HMGET', key, 'tokens', 'timestamp')
local tokens = tonumber(bucket[1])
local timestamp = tonumber(bucket[2])

if tokens == nil then
    tokens = capacity
    timestamp = now
end

local delta = math.max(0, now - timestamp)
tokens = math.min(capacity, tokens + delta * refill_rate)

local allowed = 0
if tokens >= 1 then
    allowed = 1
    tokens = tokens - 1
end

redis.call('HMSET', key, 'tokens', tokens, 'timestamp', now)
redis.call('EXPIRE', key, 3600)

return allowed
"#;

/// Admission decisions for a principal. The production implementation
/// talks to Redis; tests inject a deterministic fake instead of standing
/// up a broker, following the same pattern as the function service's
/// `Runner` trait.
#[async_trait]
pub trait AdmissionBackend: Send + Sync {
    async fn check_rate_limit(&self, principal: &str) -> Result<bool, AppError>;
    async fn acquire_concurrency_slot(&self, principal: &str) -> Result<bool, AppError>;
    async fn release_concurrency_slot(&self, principal: &str);
}

pub struct RedisAdmission {
    redis: tokio::sync::Mutex<ConnectionManager>,
    concurrency_limit: u32,
    concurrency_ttl_secs: u32,
    rate_limit_algo: RateLimitAlgo,
    rate_limit_r: u32,
    rate_limit_window_secs: u32,
}

impl RedisAdmission {
    pub fn new(
        redis: ConnectionManager,
        concurrency_limit: u32,
        concurrency_ttl_secs: u32,
        rate_limit_algo: RateLimitAlgo,
        rate_limit_r: u32,
        rate_limit_window_secs: u32,
    ) -> Self {
        Self {
            redis: tokio::sync::Mutex::new(redis),
            concurrency_limit,
            concurrency_ttl_secs,
            rate_limit_algo,
            rate_limit_r,
            rate_limit_window_secs,
        }
    }
}

#[async_trait]
impl AdmissionBackend for RedisAdmission {
    async fn acquire_concurrency_slot(&self, principal: &str) -> Result<bool, AppError> {
        let key = format!("gw:concurrency:{principal}");
        let script = Script::new(CONCURRENCY_ACQUIRE_SCRIPT);
        let mut conn = self.redis.lock().await;
        let allowed: i64 = script
            .key(key)
            .arg(self.concurrency_limit)
            .arg(self.concurrency_ttl_secs)
            .invoke_async(&mut *conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(allowed == 1)
    }

    async fn release_concurrency_slot(&self, principal: &str) {
        let key = format!("gw:concurrency:{principal}");
        let mut conn = self.redis.lock().await;
        let _: Result<i64, _> = redis::cmd("DECR").arg(&key).query_async(&mut *conn).await;
    }

    async fn check_rate_limit(&self, principal: &str) -> Result<bool, AppError> {
        let key = format!("gw:rate:{principal}");
        let mut conn = self.redis.lock().await;
        let allowed: i64 = match self.rate_limit_algo {
            RateLimitAlgo::FixedWindow => Script::new(FIXED_WINDOW_SCRIPT)
                .key(key)
                .arg(self.rate_limit_r)
                .arg(self.rate_limit_window_secs)
                .invoke_async(&mut *conn)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?,
            RateLimitAlgo::TokenBucket => {
                let refill_rate = self.rate_limit_r as f64 / self.rate_limit_window_secs as f64;
                Script::new(TOKEN_BUCKET_SCRIPT)
                    .key(key)
                    .arg(self.rate_limit_r)
                    .arg(refill_rate)
                    .invoke_async(&mut *conn)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?
            }
        };
        Ok(allowed == 1)
    }
}

/// State for the admission layer. Carries its own copy of the JWT secret so
/// it can derive the per-principal key from the bearer token directly,
/// independent of whether [`crate::middleware::auth::require_auth`] has run
/// yet — admission is meant to gate *all* traffic, authenticated or not, so
/// it must not depend on running after auth.
#[derive(Clone)]
pub struct AdmissionState {
    pub backend: Arc<dyn AdmissionBackend>,
    pub jwt_secret: Arc<str>,
}

fn principal_of(request: &Request, jwt_secret: &str) -> String {
    if let Some(user) = extract_auth_user(request, jwt_secret) {
        return format!("user:{}", user.principal);
    }
    if let Some(ClientIp(ip)) = request.extensions().get::<ClientIp>() {
        return format!("ip:{ip}");
    }
    "anonymous".to_string()
}

pub async fn admission_middleware(
    State(state): State<AdmissionState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = principal_of(&request, &state.jwt_secret);

    if !state.backend.check_rate_limit(&principal).await? {
        return Err(AppError::Admission);
    }

    if !state.backend.acquire_concurrency_slot(&principal).await? {
        return Err(AppError::Admission);
    }

    let response = next.run(request).await;
    state.backend.release_concurrency_slot(&principal).await;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_algorithms() {
        assert_eq!(RateLimitAlgo::parse("fixed-window"), RateLimitAlgo::FixedWindow);
        assert_eq!(RateLimitAlgo::parse("token-bucket"), RateLimitAlgo::TokenBucket);
        assert_eq!(RateLimitAlgo::parse("unknown"), RateLimitAlgo::TokenBucket);
    }
}
