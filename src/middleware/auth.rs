use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::database::models::User;
use crate::domain::Role;
use crate::error::ApiError;
use crate::services::session_service::SessionService;

/// Authenticated caller context, injected into every protected request.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub organization_id: Option<Uuid>,
    /// The raw bearer token; logout needs it to revoke the session row.
    pub token: String,
}

impl AuthUser {
    pub fn from_user(user: &User, token: String) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            organization_id: user.organization_id,
            token,
        }
    }
}

/// Authentication middleware for the protected API surface.
///
/// A request passes only if its bearer token verifies cryptographically,
/// has a live row in `user_sessions`, and belongs to an active user. The
/// session table is authoritative: a signed token whose row was deleted at
/// logout is rejected here even though its encoded expiry has not passed.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;

    // Signature check first: it needs no store, so a bad token is rejected
    // as unauthenticated even when the database is down.
    crate::auth::validate_jwt(&token)?;

    let sessions = SessionService::new().await?;
    let user = sessions.authenticate(&token).await?;

    let auth_user = AuthUser::from_user(&user, token);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err(ApiError::unauthorized("Empty bearer token")),
        None => Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        )),
    }
}
