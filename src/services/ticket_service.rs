use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::config;
use crate::database::models::{Attachment, Note, Ticket};
use crate::database::DatabaseManager;
use crate::domain::policy;
use crate::domain::{NoteType, TicketCategory, TicketPriority, TicketStatus};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Ticket lifecycle plus the append-only notes and attachments that hang
/// off a ticket.
///
/// Status transitions are free-form within the enumerated set; what is
/// guarded is *who* may touch a ticket (assignee, creator, or an
/// admin-level role) and who may delete one (creator or admin-level).
pub struct TicketService {
    pool: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub student_id: Option<String>,
    pub course: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub student_id: Option<String>,
    pub course: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub content: Option<String>,
    pub note_type: Option<String>,
}

impl TicketService {
    pub async fn new() -> Result<Self, ApiError> {
        Ok(Self { pool: DatabaseManager::pool().await? })
    }

    pub async fn list(&self, filter: TicketFilter) -> Result<Vec<Ticket>, ApiError> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM tickets WHERE 1=1");

        if let Some(status) = filter.status.as_deref() {
            let status = status.parse::<TicketStatus>()?;
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(priority) = filter.priority.as_deref() {
            let priority = priority.parse::<TicketPriority>()?;
            qb.push(" AND priority = ").push_bind(priority.as_str());
        }
        if let Some(category) = filter.category.as_deref() {
            let category = category.parse::<TicketCategory>()?;
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(assigned_to) = filter.assigned_to {
            qb.push(" AND assigned_to = ").push_bind(assigned_to);
        }

        qb.push(" ORDER BY created_at DESC");

        Ok(qb.build_query_as::<Ticket>().fetch_all(&self.pool).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Ticket, ApiError> {
        let ticket: Option<Ticket> = sqlx::query_as("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        ticket.ok_or_else(|| ApiError::not_found("Ticket not found"))
    }

    pub async fn create(
        &self,
        caller: &AuthUser,
        req: CreateTicketRequest,
    ) -> Result<Ticket, ApiError> {
        let mut errors = HashMap::new();
        let student_name = require(&mut errors, "student_name", req.student_name.as_deref());
        let student_email = require(&mut errors, "student_email", req.student_email.as_deref());
        let title = require(&mut errors, "title", req.title.as_deref());
        let description = require(&mut errors, "description", req.description.as_deref());
        let category_str = require(&mut errors, "category", req.category.as_deref());
        if !errors.is_empty() {
            return Err(ApiError::validation_error("Missing required fields", Some(errors)));
        }

        let category = category_str.parse::<TicketCategory>()?;
        let priority = match req.priority.as_deref() {
            Some(p) => p.parse::<TicketPriority>()?,
            None => TicketPriority::default(),
        };

        if let Some(assignee) = req.assigned_to {
            self.ensure_user_exists(assignee).await?;
        }

        let ticket: Ticket = sqlx::query_as(
            "INSERT INTO tickets
                 (id, student_name, student_email, student_id, course, category, title,
                  description, priority, status, assigned_to, created_by, due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&student_name)
        .bind(&student_email)
        .bind(&req.student_id)
        .bind(&req.course)
        .bind(category.as_str())
        .bind(&title)
        .bind(&description)
        .bind(priority.as_str())
        .bind(TicketStatus::default().as_str())
        .bind(req.assigned_to)
        .bind(caller.user_id)
        .bind(req.due_date)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(ticket = %ticket.id, created_by = %caller.email, "Ticket created");
        Ok(ticket)
    }

    pub async fn update(
        &self,
        caller: &AuthUser,
        id: Uuid,
        req: UpdateTicketRequest,
    ) -> Result<Ticket, ApiError> {
        let target = self.get(id).await?;
        policy::ensure_ticket_mutable(caller, &target)?;

        let category = match req.category.as_deref() {
            Some(c) => c.parse::<TicketCategory>()?,
            None => target.category,
        };
        let priority = match req.priority.as_deref() {
            Some(p) => p.parse::<TicketPriority>()?,
            None => target.priority,
        };
        let status = match req.status.as_deref() {
            Some(s) => s.parse::<TicketStatus>()?,
            None => target.status,
        };

        let assigned_to = match req.assigned_to {
            Some(assignee) => {
                self.ensure_user_exists(assignee).await?;
                Some(assignee)
            }
            None => target.assigned_to,
        };

        let ticket: Ticket = sqlx::query_as(
            "UPDATE tickets
             SET student_name = $1, student_email = $2, student_id = $3, course = $4,
                 category = $5, title = $6, description = $7, priority = $8, status = $9,
                 assigned_to = $10, due_date = $11, updated_at = now()
             WHERE id = $12
             RETURNING *",
        )
        .bind(req.student_name.unwrap_or(target.student_name))
        .bind(req.student_email.unwrap_or(target.student_email))
        .bind(req.student_id.or(target.student_id))
        .bind(req.course.or(target.course))
        .bind(category.as_str())
        .bind(req.title.unwrap_or(target.title))
        .bind(req.description.unwrap_or(target.description))
        .bind(priority.as_str())
        .bind(status.as_str())
        .bind(assigned_to)
        .bind(req.due_date.or(target.due_date))
        .bind(target.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Delete a ticket together with its notes and attachments.
    ///
    /// The three deletes run inside one transaction so a fault mid-sequence
    /// cannot leave orphaned child rows.
    pub async fn delete(&self, caller: &AuthUser, id: Uuid) -> Result<(), ApiError> {
        let target = self.get(id).await?;
        policy::ensure_ticket_deletable(caller, &target)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM notes WHERE ticket_id = $1")
            .bind(target.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM attachments WHERE ticket_id = $1")
            .bind(target.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(target.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(ticket = %target.id, deleted_by = %caller.email, "Ticket deleted");
        Ok(())
    }

    pub async fn notes(&self, ticket_id: Uuid) -> Result<Vec<Note>, ApiError> {
        self.get(ticket_id).await?;

        Ok(sqlx::query_as(
            "SELECT * FROM notes WHERE ticket_id = $1 ORDER BY created_at ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn add_note(
        &self,
        caller: &AuthUser,
        ticket_id: Uuid,
        req: CreateNoteRequest,
    ) -> Result<Note, ApiError> {
        let ticket = self.get(ticket_id).await?;
        policy::ensure_ticket_mutable(caller, &ticket)?;

        let content = match req.content.as_deref().map(str::trim) {
            Some(content) if !content.is_empty() => content.to_string(),
            _ => {
                let mut errors = HashMap::new();
                errors.insert("content".to_string(), "This field is required".to_string());
                return Err(ApiError::validation_error("Missing required fields", Some(errors)));
            }
        };

        let note_type = match req.note_type.as_deref() {
            Some(t) => t.parse::<NoteType>()?,
            None => NoteType::default(),
        };

        let note: Note = sqlx::query_as(
            "INSERT INTO notes (id, ticket_id, user_id, content, note_type)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(ticket.id)
        .bind(caller.user_id)
        .bind(&content)
        .bind(note_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn attachments(&self, ticket_id: Uuid) -> Result<Vec<Attachment>, ApiError> {
        self.get(ticket_id).await?;

        Ok(sqlx::query_as(
            "SELECT * FROM attachments WHERE ticket_id = $1 ORDER BY created_at ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn add_attachment(
        &self,
        caller: &AuthUser,
        ticket_id: Uuid,
        filename: &str,
        data: &[u8],
    ) -> Result<Attachment, ApiError> {
        let ticket = self.get(ticket_id).await?;
        policy::ensure_ticket_mutable(caller, &ticket)?;

        let uploads = &config::config().uploads;

        if data.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }
        if data.len() > uploads.max_upload_bytes {
            return Err(ApiError::bad_request(format!(
                "File exceeds the maximum size of {} bytes",
                uploads.max_upload_bytes
            )));
        }

        let extension = file_extension(filename).ok_or_else(|| {
            ApiError::bad_request("Uploaded file must have a file extension")
        })?;
        if !uploads.allowed_extensions.iter().any(|e| e == &extension) {
            return Err(ApiError::bad_request(format!(
                "File type .{extension} is not allowed"
            )));
        }

        // Stored under a generated name; the original filename only lives
        // in the database row.
        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        let dir = Path::new(&uploads.dir);
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            tracing::error!("Failed to create upload directory: {}", e);
            ApiError::internal_server_error("Failed to store uploaded file")
        })?;
        tokio::fs::write(dir.join(&stored_name), data).await.map_err(|e| {
            tracing::error!("Failed to write uploaded file: {}", e);
            ApiError::internal_server_error("Failed to store uploaded file")
        })?;

        let attachment: Attachment = sqlx::query_as(
            "INSERT INTO attachments (id, ticket_id, filename, file_path, file_size, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(ticket.id)
        .bind(filename)
        .bind(&stored_name)
        .bind(data.len() as i64)
        .bind(caller.user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(ticket = %ticket.id, file = %filename, "Attachment uploaded");
        Ok(attachment)
    }

    async fn ensure_user_exists(&self, id: Uuid) -> Result<(), ApiError> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if exists.is_none() {
            let mut errors = HashMap::new();
            errors.insert("assigned_to".to_string(), "No such user".to_string());
            return Err(ApiError::validation_error("Invalid assignee", Some(errors)));
        }
        Ok(())
    }
}

fn require(errors: &mut HashMap<String, String>, field: &str, value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            errors.insert(field.to_string(), "This field is required".to_string());
            String::new()
        }
    }
}

fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
