//! Ticket lifecycle endpoints plus per-ticket notes and attachments.

use axum::extract::{Multipart, Path, Query};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::database::models::{Attachment, Note, Ticket};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ticket_service::{
    CreateNoteRequest, CreateTicketRequest, TicketFilter, TicketService, UpdateTicketRequest,
};

/// GET /api/tickets - list tickets, optionally filtered by
/// status/priority/category/assignee query parameters
pub async fn tickets_get(
    Extension(_caller): Extension<AuthUser>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<Vec<Ticket>> {
    let service = TicketService::new().await?;
    let tickets = service.list(filter).await?;
    Ok(ApiResponse::success(tickets))
}

/// POST /api/tickets - create a ticket
pub async fn tickets_post(
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<CreateTicketRequest>,
) -> ApiResult<Ticket> {
    let service = TicketService::new().await?;
    let ticket = service.create(&caller, payload).await?;
    Ok(ApiResponse::created(ticket))
}

/// GET /api/tickets/:id - show a single ticket
pub async fn ticket_get(
    Extension(_caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Ticket> {
    let service = TicketService::new().await?;
    let ticket = service.get(id).await?;
    Ok(ApiResponse::success(ticket))
}

/// PUT /api/tickets/:id - update a ticket (assignee, creator, or admin)
pub async fn ticket_put(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketRequest>,
) -> ApiResult<Ticket> {
    let service = TicketService::new().await?;
    let ticket = service.update(&caller, id, payload).await?;
    Ok(ApiResponse::success(ticket))
}

/// DELETE /api/tickets/:id - delete a ticket and its notes/attachments
pub async fn ticket_delete(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let service = TicketService::new().await?;
    service.delete(&caller, id).await?;
    Ok(ApiResponse::success(serde_json::Value::Null).with_message("Ticket deleted"))
}

/// GET /api/tickets/:id/notes - list a ticket's notes
pub async fn notes_get(
    Extension(_caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Note>> {
    let service = TicketService::new().await?;
    let notes = service.notes(id).await?;
    Ok(ApiResponse::success(notes))
}

/// POST /api/tickets/:id/notes - append a note to a ticket
pub async fn notes_post(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateNoteRequest>,
) -> ApiResult<Note> {
    let service = TicketService::new().await?;
    let note = service.add_note(&caller, id, payload).await?;
    Ok(ApiResponse::created(note))
}

/// GET /api/tickets/:id/attachments - list a ticket's attachments
pub async fn attachments_get(
    Extension(_caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Attachment>> {
    let service = TicketService::new().await?;
    let attachments = service.attachments(id).await?;
    Ok(ApiResponse::success(attachments))
}

/// POST /api/tickets/:id/attachments - upload a file for a ticket
///
/// Multipart form with a single `file` field. Extension and size are
/// validated against the configured allow-list before anything is stored.
pub async fn attachments_post(
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Attachment> {
    let service = TicketService::new().await?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|f| f.to_string())
            .ok_or_else(|| ApiError::bad_request("Uploaded file must have a filename"))?;
        let data = field.bytes().await?;

        let attachment = service.add_attachment(&caller, id, &filename, &data).await?;
        return Ok(ApiResponse::created(attachment));
    }

    Err(ApiError::bad_request("Multipart field 'file' is required"))
}
