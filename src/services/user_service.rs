use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::password;
use crate::database::models::User;
use crate::database::repository::ScopedUsers;
use crate::database::DatabaseManager;
use crate::domain::policy::{self, Scope};
use crate::domain::{AccountStatus, Role};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// User management for both the org-scoped admin endpoints and the
/// system-wide supreme admin endpoints. Which records are reachable is
/// decided entirely by the [`Scope`] passed in.
pub struct UserService {
    pool: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Role string; legacy `staff` is accepted and mapped at this boundary.
    pub role: Option<String>,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub organization_id: Option<Uuid>,
}

impl UserService {
    pub async fn new() -> Result<Self, ApiError> {
        Ok(Self { pool: DatabaseManager::pool().await? })
    }

    pub async fn scope_for(&self, caller: &AuthUser) -> Result<Scope, ApiError> {
        super::resolve_scope(&self.pool, caller).await
    }

    pub async fn list(&self, scope: Scope) -> Result<Vec<User>, ApiError> {
        Ok(ScopedUsers::new(self.pool.clone(), scope).list().await?)
    }

    pub async fn create(
        &self,
        caller: &AuthUser,
        scope: Scope,
        req: CreateUserRequest,
    ) -> Result<User, ApiError> {
        let mut errors = HashMap::new();
        let name = required_text(&mut errors, "name", req.name.as_deref());
        let email = required_email(&mut errors, req.email.as_deref());
        let pass = required_password(&mut errors, req.password.as_deref());
        let role_str = required_text(&mut errors, "role", req.role.as_deref());
        if !errors.is_empty() {
            return Err(ApiError::validation_error("Missing or invalid fields", Some(errors)));
        }

        let role = parse_role(&role_str)?;
        policy::ensure_assignable_role(caller, role)?;

        // An org-scoped admin always creates into their own organization,
        // whatever the request says.
        let organization_id = match scope {
            Scope::Org { organization_id, .. } => Some(organization_id),
            Scope::Unbounded => req.organization_id,
        };

        self.ensure_email_free(&email, None).await?;

        let password_hash = password::hash_password(&pass)?;
        let user: User = sqlx::query_as(
            "INSERT INTO users (id, name, email, password_hash, role, status, organization_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(AccountStatus::Active.as_str())
        .bind(organization_id)
        .bind(caller.user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user = %user.email, role = %user.role, created_by = %caller.email, "User created");
        Ok(user)
    }

    pub async fn update(
        &self,
        caller: &AuthUser,
        scope: Scope,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<User, ApiError> {
        let repo = ScopedUsers::new(self.pool.clone(), scope);
        let target = repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        policy::ensure_user_mutable(caller, &target)?;

        let name = req.name.unwrap_or(target.name);
        let email = match req.email {
            Some(email) if email != target.email => {
                let mut errors = HashMap::new();
                let email = required_email(&mut errors, Some(&email));
                if !errors.is_empty() {
                    return Err(ApiError::validation_error("Invalid email", Some(errors)));
                }
                self.ensure_email_free(&email, Some(target.id)).await?;
                email
            }
            _ => target.email,
        };

        let role = match req.role {
            Some(role_str) => {
                let role = parse_role(&role_str)?;
                if role != target.role {
                    policy::ensure_assignable_role(caller, role)?;
                }
                role
            }
            None => target.role,
        };

        let status = match req.status {
            Some(s) => s.parse::<AccountStatus>()?,
            None => target.status,
        };

        let password_hash = match req.password {
            Some(pass) => {
                let mut errors = HashMap::new();
                let pass = required_password(&mut errors, Some(&pass));
                if !errors.is_empty() {
                    return Err(ApiError::validation_error("Invalid password", Some(errors)));
                }
                password::hash_password(&pass)?
            }
            None => target.password_hash,
        };

        // Only the unbounded scope may move a user between organizations.
        let organization_id = match scope {
            Scope::Unbounded => req.organization_id.or(target.organization_id),
            Scope::Org { .. } => target.organization_id,
        };

        let user: User = sqlx::query_as(
            "UPDATE users
             SET name = $1, email = $2, password_hash = $3, role = $4, status = $5,
                 organization_id = $6, updated_at = now()
             WHERE id = $7
             RETURNING *",
        )
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(status.as_str())
        .bind(organization_id)
        .bind(target.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete(&self, caller: &AuthUser, scope: Scope, id: Uuid) -> Result<(), ApiError> {
        let repo = ScopedUsers::new(self.pool.clone(), scope);
        let target = repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        policy::ensure_user_mutable(caller, &target)?;

        // Sessions go with the user via ON DELETE CASCADE.
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(target.id)
            .execute(&self.pool)
            .await?;

        tracing::info!(user = %target.email, deleted_by = %caller.email, "User deleted");
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), ApiError> {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        match existing {
            Some((id,)) if Some(id) != except => {
                Err(ApiError::conflict("A user with this email already exists"))
            }
            _ => Ok(()),
        }
    }
}

fn parse_role(s: &str) -> Result<Role, ApiError> {
    Role::parse_compat(s).map_err(|e| {
        ApiError::validation_error(
            "Invalid role",
            Some([("role".to_string(), e.to_string())].into_iter().collect()),
        )
    })
}

fn required_text(errors: &mut HashMap<String, String>, field: &str, value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            errors.insert(field.to_string(), "This field is required".to_string());
            String::new()
        }
    }
}

fn required_email(errors: &mut HashMap<String, String>, value: Option<&str>) -> String {
    let email = required_text(errors, "email", value);
    if !email.is_empty() && !is_valid_email(&email) {
        errors.insert("email".to_string(), "Invalid email format".to_string());
    }
    email
}

fn required_password(errors: &mut HashMap<String, String>, value: Option<&str>) -> String {
    match value {
        Some(v) if v.len() >= 8 => v.to_string(),
        Some(_) => {
            errors.insert(
                "password".to_string(),
                "Password must be at least 8 characters".to_string(),
            );
            String::new()
        }
        None => {
            errors.insert("password".to_string(), "This field is required".to_string());
            String::new()
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    parts.len() == 2 && !parts[0].is_empty() && parts[1].contains('.') && !parts[1].starts_with('.')
}
