use axum::Extension;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::session_service::SessionService;

/// GET /api/auth/me - current authenticated user
pub async fn me(Extension(caller): Extension<AuthUser>) -> ApiResult<User> {
    let sessions = SessionService::new().await?;
    let user = sessions.user_by_id(caller.user_id).await?;
    Ok(ApiResponse::success(user))
}

/// POST /api/auth/logout - revoke the current session
///
/// Deletes the session row backing this token; the token is dead from here
/// on even though its signature has not expired.
pub async fn logout(Extension(caller): Extension<AuthUser>) -> ApiResult<serde_json::Value> {
    let sessions = SessionService::new().await?;
    sessions.logout(&caller.token).await?;
    Ok(ApiResponse::success(serde_json::Value::Null).with_message("Logged out"))
}
