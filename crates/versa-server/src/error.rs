//! Error types for Versa servers

use crate::config::Environment;
use http::StatusCode;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use versa_core::{ApiVersion, FieldViolation, GenerationError, ValidationError};

/// Result type alias for handlers
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Environment detected once from `VERSA_ENV`
pub fn get_environment() -> &'static Environment {
    ENVIRONMENT.get_or_init(Environment::current)
}

/// Standard API error type
///
/// Every error leaves the server in the same JSON envelope:
///
/// ```json
/// {"error": {"type": "validation_error", "message": "...", "fields": [...]}, "request_id": "..."}
/// ```
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level validation errors
    pub fields: Option<Vec<FieldError>>,
    /// Internal details (hidden in production)
    pub(crate) internal: Option<String>,
    pub(crate) request_id: Option<String>,
}

/// Field-level validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Field name (supports nested: "address.city")
    pub field: String,
    /// Error code (e.g., "missing", "type", "max_length")
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl From<FieldViolation> for FieldError {
    fn from(violation: FieldViolation) -> Self {
        Self {
            field: if violation.field.is_empty() {
                "body".to_string()
            } else {
                violation.field
            },
            code: violation.code,
            message: violation.message,
        }
    }
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
            fields: None,
            internal: None,
            request_id: None,
        }
    }

    /// Create a validation error with field details
    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self {
            fields: Some(fields),
            ..Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed",
            )
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// The request body is larger than the app accepts
    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            format!("Request body exceeds limit of {limit} bytes"),
        )
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// The request did not name a version and the app rejects such requests
    pub fn missing_version(source: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "missing_api_version",
            format!("Missing API version, expected it in {source}"),
        )
    }

    /// The version value is not a `YYYY-MM-DD` date
    pub fn invalid_version(raw: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_api_version",
            format!("Invalid API version \"{raw}\", expected a date in YYYY-MM-DD format"),
        )
    }

    /// The version predates every declared version
    pub fn unsupported_version(requested: ApiVersion, oldest: ApiVersion) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "unsupported_api_version",
            format!("API version {requested} is not supported, the oldest supported version is {oldest}"),
        )
    }

    /// A request migration refused the request
    pub fn migration_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "migration_failed", message)
    }

    /// Add internal details (for logging, hidden from response in prod)
    pub fn with_internal(mut self, details: impl Into<String>) -> Self {
        self.internal = Some(details.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApiError {}

/// JSON representation of API error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub(crate) fn from_error(err: ApiError, environment: &Environment) -> Self {
        let message = match err.internal {
            Some(_) if err.status.is_server_error() && environment.is_production() => {
                "An internal error occurred".to_string()
            }
            Some(details) if environment.show_error_details() => format!("{} ({details})", err.message),
            _ => err.message,
        };

        Self {
            error: ErrorBody {
                error_type: err.error_type,
                message,
                fields: err.fields,
            },
            request_id: err.request_id,
        }
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self::from_error(err, get_environment())
    }
}

// Conversion from common error types
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Invalid(violations) => {
                ApiError::validation(violations.into_iter().map(FieldError::from).collect())
            }
            ValidationError::UnknownSchema(_) => {
                ApiError::internal("Request schema is not defined").with_internal(err.to_string())
            }
        }
    }
}

/// Errors raised while assembling a [`VersionedApp`](crate::VersionedApp)
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Route \"{method} {path}\" is registered more than once")]
    DuplicateRoute { path: String, method: http::Method },

    #[error("Route \"{path}\" conflicts with another route in version {version}: {details}")]
    RouteConflict {
        version: ApiVersion,
        path: String,
        details: String,
    },

    #[error("Route \"{methods} {path}\" has no handler")]
    MissingHandler { path: String, methods: String },

    #[error("Fallback version {0} is older than every declared version")]
    UnknownFallbackVersion(ApiVersion),
}
