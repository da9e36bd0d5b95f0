use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::NoteType;

/// A note appended to a ticket. Append-only: there are no update or delete
/// routes, so content is fixed at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[sqlx(try_from = "String")]
    pub note_type: NoteType,
    pub created_at: DateTime<Utc>,
}
