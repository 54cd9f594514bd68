use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// User-facing message shared by every generation failure.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate portfolios. Please try again.";

/// Kind of a field-level profile validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationKind {
    InvalidAmount,
    InvalidReturn,
    InvalidEnum,
    EmptySelection,
}

/// A single rejected profile field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Wire name of the offending field (e.g. `investmentAmount`).
    pub field: &'static str,
    pub kind: ValidationKind,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Profile input failed field-level validation.
    Validation(Vec<FieldError>),
    /// The generative model call failed, timed out, or returned malformed output.
    GenerationFailed(String),
    /// The model answered with a well-formed response holding zero portfolios.
    EmptyResult,
    /// Resource not found error.
    NotFound(String),
    /// An imported document could not be read or parsed.
    ImportFailed(String),
    /// A newer submission superseded this one.
    Conflict(String),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Error interacting with an external API.
    ExternalApiError(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Field errors carried by a `Validation` error, looking through context wrappers.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            AppError::Validation(errors) => Some(errors),
            AppError::WithContext { source, .. } => source.field_errors(),
            _ => None,
        }
    }

    /// The innermost error, with every context layer stripped.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
                write!(f, "Validation failed: {}", fields.join(", "))
            }
            AppError::GenerationFailed(msg) => write!(f, "Generation failed: {}", msg),
            AppError::EmptyResult => write!(f, "Generation returned no portfolios"),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ImportFailed(msg) => write!(f, "Import failed: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Generation failures are logged in full but reported to the client with
    /// a single generic message.
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "error": "Invalid investment profile",
                    "fields": errors,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::GenerationFailed(msg) => {
                tracing::error!("Portfolio generation failed: {}", msg);
                (StatusCode::BAD_GATEWAY, GENERATION_FAILED_MESSAGE.to_string())
            }
            AppError::EmptyResult => {
                tracing::warn!("Portfolio generation returned an empty result");
                (StatusCode::BAD_GATEWAY, GENERATION_FAILED_MESSAGE.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ImportFailed(msg) => {
                tracing::warn!("Import failed: {}", msg);
                (StatusCode::BAD_REQUEST, format!("Import failed: {}", msg))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "External service error".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                // Delegate to underlying error's response
                return (*source).into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    /// Converts a JSON body rejection (wrong content type, unparsable body)
    /// into a `BadRequest`, so it carries the usual `{"error": ...}` body.
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
