use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{AccountStatus, OrgType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub org_type: OrgType,
    #[sqlx(try_from = "String")]
    pub status: AccountStatus,
    pub created_by: Option<Uuid>,
    pub parent_organization_id: Option<Uuid>,
    /// Free-form metadata: description, address, contact details, and for
    /// universities things like founding year and campus lists.
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
