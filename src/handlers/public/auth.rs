use axum::Json;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::session_service::{LoginResult, SessionService};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login - authenticate and receive a bearer token
///
/// On success the response carries the signed token, the user record, and
/// the expiry; a matching session row is created server-side and is what
/// keeps the token alive.
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<LoginResult> {
    let mut errors = HashMap::new();
    if payload.email.as_deref().map(str::trim).unwrap_or("").is_empty() {
        errors.insert("email".to_string(), "This field is required".to_string());
    }
    if payload.password.as_deref().unwrap_or("").is_empty() {
        errors.insert("password".to_string(), "This field is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Missing required fields", Some(errors)));
    }

    let sessions = SessionService::new().await?;
    let result = sessions
        .login(
            payload.email.as_deref().unwrap_or("").trim(),
            payload.password.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(ApiResponse::success(result))
}
