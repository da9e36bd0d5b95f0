use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::Organization;
use crate::database::repository::ScopedOrganizations;
use crate::database::DatabaseManager;
use crate::domain::policy::Scope;
use crate::domain::{AccountStatus, OrgType};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Organization management. Listing and creation are open to admin-level
/// callers within their scope; update and delete sit behind the supreme
/// admin routes.
pub struct OrgService {
    pool: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: Option<String>,
    pub org_type: Option<String>,
    pub parent_organization_id: Option<Uuid>,
    /// Free-form metadata (description, address, contact details, and for
    /// universities founding year, accreditation, departments, campuses).
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub org_type: Option<String>,
    pub status: Option<String>,
    pub parent_organization_id: Option<Uuid>,
    pub settings: Option<serde_json::Value>,
}

impl OrgService {
    pub async fn new() -> Result<Self, ApiError> {
        Ok(Self { pool: DatabaseManager::pool().await? })
    }

    pub async fn scope_for(&self, caller: &AuthUser) -> Result<Scope, ApiError> {
        super::resolve_scope(&self.pool, caller).await
    }

    pub async fn list(&self, scope: Scope) -> Result<Vec<Organization>, ApiError> {
        Ok(ScopedOrganizations::new(self.pool.clone(), scope).list().await?)
    }

    pub async fn create(
        &self,
        caller: &AuthUser,
        req: CreateOrganizationRequest,
    ) -> Result<Organization, ApiError> {
        let name = match req.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                let mut errors = HashMap::new();
                errors.insert("name".to_string(), "This field is required".to_string());
                return Err(ApiError::validation_error("Missing required fields", Some(errors)));
            }
        };

        let org_type = match req.org_type.as_deref() {
            Some(t) => t.parse::<OrgType>()?,
            None => OrgType::Company,
        };

        let org: Organization = sqlx::query_as(
            "INSERT INTO organizations (id, name, org_type, status, created_by, parent_organization_id, settings)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(org_type.as_str())
        .bind(AccountStatus::Active.as_str())
        .bind(caller.user_id)
        .bind(req.parent_organization_id)
        .bind(req.settings.unwrap_or_else(|| serde_json::json!({})))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(organization = %org.name, created_by = %caller.email, "Organization created");
        Ok(org)
    }

    pub async fn update(
        &self,
        scope: Scope,
        id: Uuid,
        req: UpdateOrganizationRequest,
    ) -> Result<Organization, ApiError> {
        let repo = ScopedOrganizations::new(self.pool.clone(), scope);
        let target = repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Organization not found"))?;

        let name = req.name.unwrap_or(target.name);
        let org_type = match req.org_type.as_deref() {
            Some(t) => t.parse::<OrgType>()?,
            None => target.org_type,
        };
        let status = match req.status.as_deref() {
            Some(s) => s.parse::<AccountStatus>()?,
            None => target.status,
        };
        let settings = req.settings.unwrap_or(target.settings);
        let parent = req.parent_organization_id.or(target.parent_organization_id);

        let org: Organization = sqlx::query_as(
            "UPDATE organizations
             SET name = $1, org_type = $2, status = $3, parent_organization_id = $4,
                 settings = $5, updated_at = now()
             WHERE id = $6
             RETURNING *",
        )
        .bind(&name)
        .bind(org_type.as_str())
        .bind(status.as_str())
        .bind(parent)
        .bind(settings)
        .bind(target.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(org)
    }

    /// Delete an organization, refusing while any active user still
    /// references it. The schema's foreign key alone cannot express this
    /// business rule, so it is checked explicitly.
    pub async fn delete(&self, caller: &AuthUser, scope: Scope, id: Uuid) -> Result<(), ApiError> {
        let repo = ScopedOrganizations::new(self.pool.clone(), scope);
        let target = repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Organization not found"))?;

        let (active_users,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE organization_id = $1 AND status = 'active'",
        )
        .bind(target.id)
        .fetch_one(&self.pool)
        .await?;

        if active_users > 0 {
            return Err(ApiError::conflict(format!(
                "Cannot delete organization: {active_users} active user(s) still belong to it"
            )));
        }

        sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(target.id)
            .execute(&self.pool)
            .await?;

        tracing::info!(organization = %target.name, deleted_by = %caller.email, "Organization deleted");
        Ok(())
    }
}
