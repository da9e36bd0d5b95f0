pub mod org_service;
pub mod session_service;
pub mod ticket_service;
pub mod user_service;

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::policy::Scope;
use crate::domain::Role;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Resolve the record-visibility scope of an admin-capable caller.
///
/// The supreme admin is unbounded. An admin is pinned to their own
/// organization, falling back to the first organization they created when
/// no membership link exists yet. Anyone else has no management scope.
pub(crate) async fn resolve_scope(pool: &PgPool, caller: &AuthUser) -> Result<Scope, ApiError> {
    match caller.role {
        Role::SupremeAdmin => Ok(Scope::Unbounded),
        Role::Admin => {
            if let Some(organization_id) = caller.organization_id {
                return Ok(Scope::Org { organization_id, caller_id: caller.user_id });
            }

            let created: Option<(Uuid,)> = sqlx::query_as(
                "SELECT id FROM organizations WHERE created_by = $1 ORDER BY created_at LIMIT 1",
            )
            .bind(caller.user_id)
            .fetch_optional(pool)
            .await?;

            match created {
                Some((organization_id,)) => {
                    Ok(Scope::Org { organization_id, caller_id: caller.user_id })
                }
                None => Err(ApiError::forbidden(
                    "Administrator account is not linked to an organization",
                )),
            }
        }
        _ => Err(ApiError::forbidden("Administrator access required")),
    }
}
