//! System-level organization and user administration:
//! /api/organizational/organizations and /api/organizational/users.
//!
//! Listing and creating organizations is open to admin-level callers
//! (scoped); updating or deleting an organization and managing users here
//! requires the supreme admin.

use axum::{extract::Path, Extension, Json};
use uuid::Uuid;

use crate::database::models::{Organization, User};
use crate::domain::policy::{self, Scope};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::org_service::{
    CreateOrganizationRequest, OrgService, UpdateOrganizationRequest,
};
use crate::services::user_service::{CreateUserRequest, UserService};

/// GET /api/organizational/organizations - list organizations in scope
pub async fn organizations_get(
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<Organization>> {
    policy::require_admin(&caller)?;

    let service = OrgService::new().await?;
    let scope = service.scope_for(&caller).await?;
    let orgs = service.list(scope).await?;

    Ok(ApiResponse::success(orgs))
}

/// POST /api/organizational/organizations - create an organization
pub async fn organizations_post(
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<CreateOrganizationRequest>,
) -> ApiResult<Organization> {
    policy::require_admin(&caller)?;

    let service = OrgService::new().await?;
    let org = service.create(&caller, payload).await?;

    Ok(ApiResponse::created(org))
}

/// PUT /api/organizational/organizations/:id - update an organization
pub async fn organization_put(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrganizationRequest>,
) -> ApiResult<Organization> {
    policy::require_supreme_admin(&caller)?;

    let service = OrgService::new().await?;
    let org = service.update(Scope::Unbounded, id, payload).await?;

    Ok(ApiResponse::success(org))
}

/// DELETE /api/organizational/organizations/:id - delete an organization
///
/// Fails while any active user still belongs to the organization.
pub async fn organization_delete(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    policy::require_supreme_admin(&caller)?;

    let service = OrgService::new().await?;
    service.delete(&caller, Scope::Unbounded, id).await?;

    Ok(ApiResponse::success(serde_json::Value::Null).with_message("Organization deleted"))
}

/// GET /api/organizational/users - list every user in the system
pub async fn users_get(Extension(caller): Extension<AuthUser>) -> ApiResult<Vec<User>> {
    policy::require_supreme_admin(&caller)?;

    let service = UserService::new().await?;
    let users = service.list(Scope::Unbounded).await?;

    Ok(ApiResponse::success(users))
}

/// POST /api/organizational/users - create a user in any organization
pub async fn users_post(
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<User> {
    policy::require_supreme_admin(&caller)?;

    let service = UserService::new().await?;
    let user = service.create(&caller, Scope::Unbounded, payload).await?;

    Ok(ApiResponse::created(user))
}

/// DELETE /api/organizational/users/:id - delete any user
///
/// Still refuses to touch the supreme admin account.
pub async fn user_delete(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    policy::require_supreme_admin(&caller)?;

    let service = UserService::new().await?;
    service.delete(&caller, Scope::Unbounded, id).await?;

    Ok(ApiResponse::success(serde_json::Value::Null).with_message("User deleted"))
}
