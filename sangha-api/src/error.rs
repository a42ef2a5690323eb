//! Error Types for the Sangha API
//!
//! This module defines error handling for the HTTP layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//! - Conversions from the domain error enums
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sangha_core::{AuthzError, EligibilityError, MandateError, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401, 403)
    // ========================================================================
    /// Request lacks the forwarded identity headers
    Unauthorized,

    /// Request is authenticated but the permission check denied it
    Forbidden,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    /// Requested resolution does not exist
    ResolutionNotFound,

    /// Requested leadership position does not exist
    PositionNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Resolution failed an execution eligibility check
    NotEligible,

    /// Operation conflicts with current state
    StateConflict,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Store operation failed
    StorageError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,

            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            // Validation errors
            ErrorCode::InvalidInput | ErrorCode::MissingField | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }

            // Not found errors
            ErrorCode::EntityNotFound
            | ErrorCode::ResolutionNotFound
            | ErrorCode::PositionNotFound => StatusCode::NOT_FOUND,

            // Conflict errors
            ErrorCode::NotEligible | ErrorCode::StateConflict => StatusCode::CONFLICT,

            // Server errors
            ErrorCode::InternalError | ErrorCode::StorageError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Identity headers required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::ResolutionNotFound => "Resolution not found",
            ErrorCode::PositionNotFound => "Position not found",
            ErrorCode::NotEligible => "Resolution is not eligible for execution",
            ErrorCode::StateConflict => "Operation conflicts with current state",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageError => "Store operation failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
///
/// This type is returned by all API endpoints when an error occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (field errors, target ids, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    /// Create a generic not found error with custom message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    /// Create a ResolutionNotFound error.
    pub fn resolution_not_found(resolution_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ResolutionNotFound,
            format!("Resolution {} not found", resolution_id),
        )
    }

    /// Create a PositionNotFound error.
    pub fn position_not_found(position_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::PositionNotFound,
            format!("Position {} not found or not switchable", position_id),
        )
    }

    /// Create a StateConflict error.
    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateConflict, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a StorageError.
    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Implement IntoResponse for ApiError to enable automatic error handling in Axum.
///
/// This allows ApiError to be returned directly from Axum handlers:
/// ```ignore
/// async fn handler() -> Result<Json<Response>, ApiError> {
///     Err(ApiError::forbidden("Permission denied"))
/// }
/// ```
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

/// Convert from StoreError to ApiError.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound { .. } => ApiError::new(ErrorCode::EntityNotFound, message),
            StoreError::Conflict { .. } => ApiError::new(ErrorCode::StateConflict, message),
            StoreError::TransactionFailed { .. } | StoreError::LockPoisoned => {
                // Log the full error; the response stays generic.
                tracing::error!(error = %message, "store failure");
                ApiError::storage_error("Store operation failed")
            }
        }
    }
}

/// Convert from AuthzError to ApiError.
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Denied { .. } => ApiError::forbidden(err.to_string()),
            AuthzError::Store(store) => store.into(),
        }
    }
}

/// Convert from EligibilityError to ApiError.
///
/// The Display string carries the specific failing check; it is surfaced
/// verbatim as the conflict reason.
impl From<EligibilityError> for ApiError {
    fn from(err: EligibilityError) -> Self {
        ApiError::new(ErrorCode::NotEligible, err.to_string())
    }
}

/// Convert from MandateError to ApiError.
impl From<MandateError> for ApiError {
    fn from(err: MandateError) -> Self {
        match err {
            MandateError::NoActivePosition => ApiError::forbidden(err.to_string()),
            MandateError::NotEligible(eligibility) => eligibility.into(),
            MandateError::ResolutionNotFound { id } => ApiError::resolution_not_found(id),
            MandateError::ActionFailed { reason } => {
                ApiError::internal_error(format!("Resolution action failed: {}", reason))
            }
            MandateError::Store(store) => store.into(),
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

/// Convert from uuid::Error to ApiError.
impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::invalid_format("id", &format!("valid UUID: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
