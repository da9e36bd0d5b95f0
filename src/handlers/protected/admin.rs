//! Organization-scoped user management: /api/admin/users.
//!
//! Available to admin-level callers; every operation resolves the caller's
//! scope first, so an admin only ever reaches users of their own
//! organization (and never other admins).

use axum::{extract::Path, Extension, Json};
use uuid::Uuid;

use crate::database::models::User;
use crate::domain::policy;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::{CreateUserRequest, UpdateUserRequest, UserService};

/// GET /api/admin/users - list users within the caller's scope
pub async fn users_get(Extension(caller): Extension<AuthUser>) -> ApiResult<Vec<User>> {
    policy::require_admin(&caller)?;

    let service = UserService::new().await?;
    let scope = service.scope_for(&caller).await?;
    let users = service.list(scope).await?;

    Ok(ApiResponse::success(users))
}

/// POST /api/admin/users - create a user inside the caller's organization
pub async fn users_post(
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<User> {
    policy::require_admin(&caller)?;

    let service = UserService::new().await?;
    let scope = service.scope_for(&caller).await?;
    let user = service.create(&caller, scope, payload).await?;

    Ok(ApiResponse::created(user))
}

/// PUT /api/admin/users/:id - update a user within scope
pub async fn user_put(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<User> {
    policy::require_admin(&caller)?;

    let service = UserService::new().await?;
    let scope = service.scope_for(&caller).await?;
    let user = service.update(&caller, scope, id, payload).await?;

    Ok(ApiResponse::success(user))
}

/// DELETE /api/admin/users/:id - delete a user within scope
pub async fn user_delete(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    policy::require_admin(&caller)?;

    let service = UserService::new().await?;
    let scope = service.scope_for(&caller).await?;
    service.delete(&caller, scope, id).await?;

    Ok(ApiResponse::success(serde_json::Value::Null).with_message("User deleted"))
}
