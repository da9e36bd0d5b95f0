use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::manager::DatabaseError;
use crate::auth::password;
use crate::config;
use crate::domain::{AccountStatus, OrgType, Role};

/// Seed the very first account: one supreme admin and one default
/// organization, created only when the users table is empty.
///
/// Idempotent by construction; a second boot finds users and does nothing.
pub async fn ensure_seed(pool: &PgPool) -> Result<(), DatabaseError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Ok(());
    }

    let bootstrap = &config::config().bootstrap;
    let password_hash = password::hash_password(&bootstrap.admin_password)
        .map_err(|e| DatabaseError::MigrationError(format!("bootstrap password hash: {e}")))?;

    let org_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO organizations (id, name, org_type, status, settings)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(org_id)
    .bind(&bootstrap.organization_name)
    .bind(OrgType::Company.as_str())
    .bind(AccountStatus::Active.as_str())
    .bind(serde_json::json!({ "description": "Created at first startup" }))
    .execute(&mut *tx)
    .await?;

    // The supreme admin is not bound to any organization.
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, status)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(admin_id)
    .bind(&bootstrap.admin_name)
    .bind(&bootstrap.admin_email)
    .bind(&password_hash)
    .bind(Role::SupremeAdmin.as_str())
    .bind(AccountStatus::Active.as_str())
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE organizations SET created_by = $1 WHERE id = $2")
        .bind(admin_id)
        .bind(org_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        email = %bootstrap.admin_email,
        organization = %bootstrap.organization_name,
        "Bootstrap complete: created supreme admin and default organization"
    );
    Ok(())
}
