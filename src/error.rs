//! Structured error types for API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::generation::GenerationError;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidBody,

    // Authentication and ownership
    Unauthorized,
    InvalidToken,
    Forbidden,

    // Not found errors
    UserNotFound,
    ProjectNotFound,
    TaskNotFound,
    StateNotFound,
    CommentNotFound,

    // Conflict errors
    AlreadyExists,
    StateInUse,
    ProtectedState,

    // Text generation errors
    GenerationFailed,
    GenerationTimeout,
    GenerationUnavailable,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::InvalidBody => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken | ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::UserNotFound
            | ErrorCode::ProjectNotFound
            | ErrorCode::TaskNotFound
            | ErrorCode::StateNotFound
            | ErrorCode::CommentNotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists | ErrorCode::StateInUse | ErrorCode::ProtectedState => {
                StatusCode::CONFLICT
            }
            ErrorCode::GenerationFailed => StatusCode::BAD_GATEWAY,
            ErrorCode::GenerationTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::GenerationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error returned by every handler.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required.", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidBody, "Malformed request body.").with_details(reason)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn invalid_token() -> Self {
        Self::new(ErrorCode::InvalidToken, "Invalid token")
    }

    pub fn forbidden(message: &str) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn user_not_found() -> Self {
        Self::new(ErrorCode::UserNotFound, "User not found.")
    }

    pub fn project_not_found(project_id: i64) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {}", project_id),
        )
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {}", task_id))
    }

    pub fn state_not_found(state_id: i64) -> Self {
        Self::new(
            ErrorCode::StateNotFound,
            format!("State not found: {}", state_id),
        )
    }

    pub fn comment_not_found(comment_id: i64) -> Self {
        Self::new(
            ErrorCode::CommentNotFound,
            format!("Comment not found: {}", comment_id),
        )
    }

    pub fn already_exists(what: &str) -> Self {
        Self::new(ErrorCode::AlreadyExists, format!("{} already exists", what))
    }

    pub fn state_in_use(slug: &str, references: i64) -> Self {
        Self::new(
            ErrorCode::StateInUse,
            format!(
                "State '{}' is referenced by {} task state assignment(s)",
                slug, references
            ),
        )
    }

    pub fn protected_state(slug: &str) -> Self {
        Self::new(
            ErrorCode::ProtectedState,
            format!("State '{}' is assigned to every new task and cannot be deleted", slug),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, "Database error.").with_details(err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, "Internal error.").with_details(err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to ApiError first
        let err = match err.downcast::<ApiError>() {
            Ok(api_err) => return api_err,
            Err(err) => err,
        };
        match err.downcast::<rusqlite::Error>() {
            Ok(rusqlite::Error::SqliteFailure(failure, message))
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                ApiError::new(ErrorCode::AlreadyExists, "Constraint violation")
                    .with_details(message.unwrap_or_else(|| failure.to_string()))
            }
            Ok(db_err) => ApiError::database(db_err),
            Err(err) => ApiError::internal(err),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let code = match &err {
            GenerationError::Timeout(_) => ErrorCode::GenerationTimeout,
            GenerationError::NotConfigured(_) => ErrorCode::GenerationUnavailable,
            _ => ErrorCode::GenerationFailed,
        };
        ApiError::new(code, "Text generation failed.").with_details(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, details = ?self.details, "{}", self.message);
        } else {
            tracing::debug!(code = ?self.code, "{}", self.message);
        }
        (status, axum::Json(self)).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn codes_map_to_statuses() {
        assert_eq!(
            ApiError::missing_field("name").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::task_not_found(1).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::state_in_use("to-do", 2).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::invalid_token().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::unauthorized("Token not provided").status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn anyhow_roundtrip_keeps_api_error() {
        let err: anyhow::Error = ApiError::project_not_found(4).into();
        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::ProjectNotFound);
    }

    #[test]
    fn unknown_anyhow_becomes_internal() {
        let api: ApiError = anyhow::anyhow!("boom").into();
        assert_eq!(api.code, ErrorCode::InternalError);
        assert_eq!(api.details.as_deref(), Some("boom"));
    }

    #[test]
    fn only_unique_violations_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY, slug TEXT UNIQUE);
             CREATE TABLE child (
                 id INTEGER PRIMARY KEY,
                 parent_id INTEGER NOT NULL REFERENCES parent(id),
                 kind TEXT CHECK (kind IN ('a', 'b'))
             );
             INSERT INTO parent (id, slug) VALUES (1, 'x');",
        )
        .unwrap();

        let to_api = |sql: &str| -> ApiError {
            let err = conn.execute(sql, []).unwrap_err();
            anyhow::Error::from(err).into()
        };

        let unique = to_api("INSERT INTO parent (slug) VALUES ('x')");
        assert_eq!(unique.code, ErrorCode::AlreadyExists);

        let foreign_key = to_api("INSERT INTO child (parent_id) VALUES (99)");
        assert_eq!(foreign_key.code, ErrorCode::DatabaseError);

        let check = to_api("INSERT INTO child (parent_id, kind) VALUES (1, 'z')");
        assert_eq!(check.code, ErrorCode::DatabaseError);
        assert_eq!(check.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generation_errors_are_distinct() {
        let timeout: ApiError = GenerationError::Timeout(Duration::from_secs(1)).into();
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let parse: ApiError = GenerationError::Unparsable("not json".to_string()).into();
        assert_eq!(parse.code, ErrorCode::GenerationFailed);

        let missing: ApiError = GenerationError::NotConfigured("watsonx".to_string()).into();
        assert_eq!(missing.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn serializes_without_empty_fields() {
        let json = serde_json::to_value(ApiError::missing_field("taskId")).unwrap();
        assert_eq!(json["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(json["field"], "taskId");
        assert!(json.get("details").is_none());
    }
}
