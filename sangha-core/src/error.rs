//! Error types for Sangha operations

use crate::enums::{AppealStatus, EntityType, PermissionAction, ResolutionStatus};
use crate::identity::{AppealId, ResolutionId, Timestamp};
use thiserror::Error;
use uuid::Uuid;

/// Store layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Conflict on {entity_type:?}: {reason}")]
    Conflict { entity_type: EntityType, reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Authorization errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Not authorized to perform '{permission_key}' ({action})")]
    Denied {
        permission_key: String,
        action: PermissionAction,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Resolution eligibility errors, one per validation step.
///
/// Display strings are the user-visible reasons the HTTP layer surfaces;
/// each names the specifics of the failing check.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EligibilityError {
    #[error("Resolution is in '{status}' state, cannot execute (expected passed)")]
    WrongStatus { status: ResolutionStatus },

    #[error("Resolution was already executed at {executed_at}")]
    AlreadyExecuted { executed_at: Timestamp },

    #[error("Resolution type mismatch: expected '{expected}', got '{actual}'")]
    TypeMismatch { expected: String, actual: String },

    #[error("Resolution category mismatch: expected '{expected}', got '{actual}'")]
    CategoryMismatch { expected: String, actual: String },

    #[error("Resolution has no proposed action map")]
    MissingProposedAction,

    #[error("Proposed action mismatch on '{key}': expected {expected}")]
    TargetMismatch {
        key: String,
        expected: serde_json::Value,
    },

    #[error("Execution frozen by appeal {appeal_id} in '{status}' status")]
    ExecutionFrozen {
        appeal_id: AppealId,
        status: AppealStatus,
    },
}

/// Resolution execution errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MandateError {
    #[error("Caller must hold an active portfolio to execute a resolution")]
    NoActivePosition,

    #[error("Resolution not eligible: {0}")]
    NotEligible(#[from] EligibilityError),

    #[error("Resolution not found: {id}")]
    ResolutionNotFound { id: ResolutionId },

    #[error("Resolution action failed: {reason}")]
    ActionFailed { reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Sangha errors.
#[derive(Debug, Clone, Error)]
pub enum SanghaError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Authorization error: {0}")]
    Authz(#[from] AuthzError),

    #[error("Eligibility error: {0}")]
    Eligibility(#[from] EligibilityError),

    #[error("Mandate error: {0}")]
    Mandate(#[from] MandateError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Sangha operations.
pub type SanghaResult<T> = Result<T, SanghaError>;

// =============================================================================
// TESTS
// =============================================================================
