use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{self, password, Claims};
use crate::database::models::{User, UserSession};
use crate::database::DatabaseManager;
use crate::error::ApiError;

/// Login, logout, and per-request session validation.
///
/// A bearer token is only as alive as its `user_sessions` row: login
/// inserts one, logout deletes it, and `authenticate` refuses any token
/// without a live row no matter how valid its signature still is.
pub struct SessionService {
    pool: PgPool,
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

impl SessionService {
    pub async fn new() -> Result<Self, ApiError> {
        Ok(Self { pool: DatabaseManager::pool().await? })
    }

    pub async fn login(&self, email: &str, pass: &str) -> Result<LoginResult, ApiError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        // Same message for unknown email and wrong password.
        let user = user.ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

        if !user.status.is_active() {
            return Err(ApiError::unauthorized("Account is inactive"));
        }

        if !password::verify_password(pass, &user.password_hash)? {
            return Err(ApiError::unauthorized("Invalid email or password"));
        }

        let claims = Claims::new(user.id, user.email.clone(), user.role, user.organization_id);
        let token = auth::generate_jwt(&claims)?;
        let expires_at = claims.expires_at();

        sqlx::query(
            "INSERT INTO user_sessions (id, user_id, token, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(&token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        let user: User =
            sqlx::query_as("UPDATE users SET last_login = now() WHERE id = $1 RETURNING *")
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;

        tracing::info!(user = %user.email, "Login");
        Ok(LoginResult { token, user, expires_at })
    }

    /// Delete the session row; the token is unusable from this moment even
    /// though its signature stays valid until the encoded expiry.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM user_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Full authentication check for one request: signature, live session
    /// row, active user. Any single failure reads as unauthenticated.
    pub async fn authenticate(&self, token: &str) -> Result<User, ApiError> {
        auth::validate_jwt(token)?;

        let session: Option<UserSession> = sqlx::query_as(
            "SELECT * FROM user_sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let session =
            session.ok_or_else(|| ApiError::unauthorized("Session expired or revoked"))?;

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(session.user_id)
            .fetch_optional(&self.pool)
            .await?;

        let user = user.ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

        if !user.status.is_active() {
            return Err(ApiError::unauthorized("Account is inactive"));
        }

        Ok(user)
    }

    /// Fresh user row for the `/api/auth/me` endpoint.
    pub async fn user_by_id(&self, id: Uuid) -> Result<User, ApiError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or_else(|| ApiError::not_found("User not found"))
    }
}
