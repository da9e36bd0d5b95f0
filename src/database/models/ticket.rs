use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{TicketCategory, TicketPriority, TicketStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub student_id: Option<String>,
    pub course: Option<String>,
    #[sqlx(try_from = "String")]
    pub category: TicketCategory,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub priority: TicketPriority,
    #[sqlx(try_from = "String")]
    pub status: TicketStatus,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
