//! Scope-aware data access for users and organizations.
//!
//! Tenant scoping is enforced here, in one place, instead of as repeated
//! `WHERE organization_id = ?` fragments in every handler: construct a
//! repository with the caller's [`Scope`] and it only ever returns rows
//! that scope permits. Out-of-scope lookups come back as `None`, which the
//! service layer reports as not-found.

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Organization, User};
use crate::domain::policy::Scope;
use crate::domain::Role;

pub struct ScopedUsers {
    pool: PgPool,
    scope: Scope,
}

impl ScopedUsers {
    pub fn new(pool: PgPool, scope: Scope) -> Self {
        Self { pool, scope }
    }

    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        match self.scope {
            Scope::Unbounded => {
                sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await
            }
            Scope::Org { organization_id, .. } => {
                // Admin-level rows are invisible to an org-scoped caller.
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users
                     WHERE organization_id = $1 AND role NOT IN ($2, $3)
                     ORDER BY created_at DESC",
                )
                .bind(organization_id)
                .bind(Role::Admin.as_str())
                .bind(Role::SupremeAdmin.as_str())
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    /// Fetch a user by id; out-of-scope rows read as absent.
    pub async fn get(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user.filter(|u| self.scope.permits_user(u)))
    }

}

pub struct ScopedOrganizations {
    pool: PgPool,
    scope: Scope,
}

impl ScopedOrganizations {
    pub fn new(pool: PgPool, scope: Scope) -> Self {
        Self { pool, scope }
    }

    pub async fn list(&self) -> Result<Vec<Organization>, sqlx::Error> {
        match self.scope {
            Scope::Unbounded => {
                sqlx::query_as::<_, Organization>(
                    "SELECT * FROM organizations ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
            Scope::Org { organization_id, caller_id } => {
                // Own organization plus any the caller created themselves.
                sqlx::query_as::<_, Organization>(
                    "SELECT * FROM organizations
                     WHERE id = $1 OR created_by = $2
                     ORDER BY created_at DESC",
                )
                .bind(organization_id)
                .bind(caller_id)
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    /// Fetch an organization by id; out-of-scope rows read as absent.
    pub async fn get(&self, id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(org.filter(|o| self.scope.permits_organization(o)))
    }
}
