//! Error schemas shared by every version document
//!
//! These match the error envelope the server writes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorSchema {
    pub error: ErrorBodySchema,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error body details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBodySchema {
    /// Error type identifier (`validation_error`, `unsupported_api_version`, ...)
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    /// Field-level errors, present for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldErrorSchema>>,
}

/// Field-level validation error
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldErrorSchema {
    /// Dotted path such as `address.city`
    pub field: String,
    pub code: String,
    pub message: String,
}
