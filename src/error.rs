// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Everything a request can fail with collapses into this type, which
/// renders as the standard `{ success: false, message, errors? }` envelope.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    // Duplicate email, organization deletion blocked by members, etc.
    // Reported as 400 to match the frontend's error handling.
    Conflict(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Conflict(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::TooManyRequests(_) => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Conflict(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "message": self.message(),
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            body["errors"] = json!(field_errors);
        }

        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        match err {
            crate::database::manager::DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            crate::database::manager::DatabaseError::ConfigMissing(_) => {
                ApiError::service_unavailable("Database not configured")
            }
            crate::database::manager::DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            crate::database::manager::DatabaseError::Sqlx(sqlx_err) => sqlx_err.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                // Unique constraint violation; the only unique business key is email.
                ApiError::conflict("A record with this value already exists")
            }
            _ => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::auth::JwtError> for ApiError {
    fn from(err: crate::auth::JwtError) -> Self {
        match err {
            crate::auth::JwtError::TokenValidation(msg) => ApiError::unauthorized(msg),
            other => {
                tracing::error!("JWT error: {}", other);
                ApiError::internal_server_error("Failed to process authentication token")
            }
        }
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Password hash error: {}", err);
        ApiError::internal_server_error("Failed to process credentials")
    }
}

impl From<crate::domain::ticket::EnumParseError> for ApiError {
    fn from(err: crate::domain::ticket::EnumParseError) -> Self {
        ApiError::validation_error(err.to_string(), None)
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::bad_request(format!("Invalid multipart payload: {}", err))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::forbidden("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::conflict("x").status_code(), 400);
        assert_eq!(ApiError::validation_error("x", None).status_code(), 400);
    }

    #[test]
    fn envelope_reports_failure_and_message() {
        let body = ApiError::not_found("Ticket not found").to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Ticket not found");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn validation_envelope_includes_field_errors() {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), "This field is required".to_string());
        let body = ApiError::validation_error("Missing required fields", Some(fields)).to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["email"], "This field is required");
    }
}
