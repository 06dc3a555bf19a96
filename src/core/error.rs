//! Typed error handling for the CRM service
//!
//! Handlers return [`CrmError`], which knows its HTTP status and renders the
//! standard `{ success: false, message, code, details }` body.
//!
//! # Error Categories
//!
//! - [`EntityError`]: record lookups and conflicts
//! - [`ValidationError`]: malformed ids, payloads and queries
//! - [`RequestError`]: credential failures
//! - [`StorageError`]: store backend failures
//! - [`ConfigError`]: configuration loading and validation
//! - [`MailError`]: outbound email
//!
//! # Example
//!
//! ```rust,ignore
//! async fn load(store: &dyn DataService<Lead>, id: Uuid) -> Result<Lead, CrmError> {
//!     store.get(&id).await?.ok_or(CrmError::Entity(EntityError::NotFound {
//!         entity_type: "lead".to_string(),
//!         id,
//!     }))
//! }
//! ```

use crate::mail::MailError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// The main error type for the CRM service
#[derive(Debug)]
pub enum CrmError {
    /// Record-related errors
    Entity(EntityError),

    /// Validation errors
    Validation(ValidationError),

    /// Authentication errors
    Request(RequestError),

    /// Storage backend errors
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// Outbound mail errors
    Mail(MailError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for CrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrmError::Entity(e) => write!(f, "{}", e),
            CrmError::Validation(e) => write!(f, "{}", e),
            CrmError::Request(e) => write!(f, "{}", e),
            CrmError::Storage(e) => write!(f, "{}", e),
            CrmError::Config(e) => write!(f, "{}", e),
            CrmError::Mail(e) => write!(f, "{}", e),
            CrmError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for CrmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrmError::Entity(e) => Some(e),
            CrmError::Validation(e) => Some(e),
            CrmError::Request(e) => Some(e),
            CrmError::Storage(e) => Some(e),
            CrmError::Config(e) => Some(e),
            CrmError::Mail(e) => Some(e),
            CrmError::Internal(_) => None,
        }
    }
}

/// Error body returned to HTTP clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CrmError {
    /// Shorthand for a record-not-found error
    pub fn not_found(entity_type: &str, id: Uuid) -> Self {
        CrmError::Entity(EntityError::NotFound {
            entity_type: entity_type.to_string(),
            id,
        })
    }

    /// Shorthand for a single-field validation error
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        CrmError::Validation(ValidationError::FieldError {
            field: field.to_string(),
            message: message.into(),
        })
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CrmError::Entity(e) => e.status_code(),
            CrmError::Validation(_) => StatusCode::BAD_REQUEST,
            CrmError::Request(e) => e.status_code(),
            CrmError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CrmError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CrmError::Mail(MailError::MissingRecipient) => StatusCode::BAD_REQUEST,
            CrmError::Mail(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CrmError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CrmError::Entity(e) => e.error_code(),
            CrmError::Validation(_) => "VALIDATION_ERROR",
            CrmError::Request(e) => e.error_code(),
            CrmError::Storage(_) => "STORAGE_ERROR",
            CrmError::Config(_) => "CONFIG_ERROR",
            CrmError::Mail(_) => "MAIL_ERROR",
            CrmError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            message: self.to_string(),
            code: self.error_code().to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            CrmError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id.to_string()
                }))
            }
            CrmError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for CrmError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for CrmError {
    fn from(err: anyhow::Error) -> Self {
        CrmError::Storage(StorageError::QueryError {
            message: format!("{:#}", err),
        })
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to record operations
#[derive(Debug)]
pub enum EntityError {
    /// Record was not found
    NotFound { entity_type: String, id: Uuid },

    /// A record with the same unique key already exists
    AlreadyExists { entity_type: String, key: String },

    /// Failed to serialize/deserialize a record
    SerializationError { entity_type: String, message: String },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotFound { entity_type, id } => {
                write!(f, "{} with id '{}' not found", entity_type, id)
            }
            EntityError::AlreadyExists { entity_type, key } => {
                write!(f, "{} '{}' already exists", entity_type, key)
            }
            EntityError::SerializationError {
                entity_type,
                message,
            } => {
                write!(
                    f,
                    "Failed to serialize/deserialize {}: {}",
                    entity_type, message
                )
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::AlreadyExists { .. } => StatusCode::CONFLICT,
            EntityError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::AlreadyExists { .. } => "ENTITY_ALREADY_EXISTS",
            EntityError::SerializationError { .. } => "ENTITY_SERIALIZATION_ERROR",
        }
    }
}

impl From<EntityError> for CrmError {
    fn from(err: EntityError) -> Self {
        CrmError::Entity(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Single field validation error
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    FieldErrors(Vec<FieldValidationError>),

    /// Payload was not a JSON object or did not fit the record shape
    InvalidPayload { message: String },

    /// Invalid record id
    InvalidId { value: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldError { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidPayload { message } => {
                write!(f, "Invalid payload: {}", message)
            }
            ValidationError::InvalidId { value } => {
                write!(f, "Invalid object id: {}", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for CrmError {
    fn from(err: ValidationError) -> Self {
        CrmError::Validation(err)
    }
}

impl From<validator::ValidationErrors> for CrmError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldValidationError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        CrmError::Validation(ValidationError::FieldErrors(fields))
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to credentials and tokens
#[derive(Debug)]
pub enum RequestError {
    /// Credentials were rejected
    Unauthorized { message: String },

    /// Token is unknown or expired
    InvalidToken { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
            RequestError::InvalidToken { message } => write!(f, "Invalid token: {}", message),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RequestError::InvalidToken { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::InvalidToken { .. } => "INVALID_TOKEN",
        }
    }
}

impl From<RequestError> for CrmError {
    fn from(err: RequestError) -> Self {
        CrmError::Request(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Connection error
    ConnectionError { backend: String, message: String },

    /// Query execution error
    QueryError { message: String },

    /// Backend not compiled in or not configured
    Unavailable { backend: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Failed to connect to {}: {}", backend, message)
            }
            StorageError::QueryError { message } => write!(f, "{}", message),
            StorageError::Unavailable { backend } => {
                write!(f, "Storage backend '{}' is unavailable", backend)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for CrmError {
    fn from(err: StorageError) -> Self {
        CrmError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for CrmError {
    fn from(err: ConfigError) -> Self {
        CrmError::Config(err)
    }
}

impl From<MailError> for CrmError {
    fn from(err: MailError) -> Self {
        CrmError::Mail(err)
    }
}
