pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::domain::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Unique token id; two logins in the same second must still mint
    /// distinct tokens, since sessions are stored keyed by token.
    pub jti: Uuid,
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub organization_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, role: Role, organization_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            jti: Uuid::new_v4(),
            sub: user_id,
            email,
            role,
            organization_id,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn expires_at(&self) -> chrono::DateTime<Utc> {
        chrono::DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    TokenValidation(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::TokenValidation(e.to_string()))
}
