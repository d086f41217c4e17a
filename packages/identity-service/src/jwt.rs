//! Access-token issuance. Refresh tokens are opaque random strings
//! persisted server-side, not JWTs — only the access token needs to be
//! independently verifiable by the gateway.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TOKEN_TTL_MINS: i64 = 15;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub fn refresh_token_ttl() -> Duration {
    Duration::days(REFRESH_TOKEN_TTL_DAYS)
}

pub fn issue_access_token(
    user_id: Uuid,
    roles: &[String],
    secret: &str,
    issuer: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        roles: roles.to_vec(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::minutes(ACCESS_TOKEN_TTL_MINS)).timestamp() as usize,
        iss: issuer.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn generate_refresh_token() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| format!("{:x}", rng.gen_range(0..16)))
        .collect()
}

/// Decodes and verifies an access token. Used by this crate's own tests;
/// the gateway carries an independent copy of this logic rather than
/// depending on this crate, matching the services' no-shared-crate
/// contract.
pub fn decode_access_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims_through_encode_and_decode() {
        let user_id = Uuid::new_v4();
        let roles = vec!["user".to_string(), "admin".to_string()];
        let token = issue_access_token(user_id, &roles, "s3cr3t", "platform-identity").unwrap();

        let claims = decode_access_token(&token, "s3cr3t").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.roles, roles);
        assert_eq!(claims.iss, "platform-identity");
    }

    #[test]
    fn rejects_token_signed_with_a_different_secret() {
        let user_id = Uuid::new_v4();
        let token =
            issue_access_token(user_id, &["user".to_string()], "s3cr3t", "platform-identity")
                .unwrap();

        assert!(decode_access_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn refresh_tokens_are_not_blank_and_differ_per_call() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }
}
