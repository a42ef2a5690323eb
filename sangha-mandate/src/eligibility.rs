//! Resolution eligibility validation
//!
//! Seven ordered checks decide whether a resolution may authorize an action
//! right now. The first failing check wins and its error carries the
//! user-visible reason; reordering would change which reason surfaces, so
//! the order is part of the contract.

use sangha_core::{Appeal, EligibilityError, Resolution, ResolutionStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an action demands of the resolution that authorizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExecutionRequirements {
    /// Required `resolution_type`, e.g. `disciplinary`.
    pub resolution_type: String,
    /// Required `category`, e.g. `member_suspension`.
    pub category: String,
    /// Keys that must appear in the resolution's `proposed_action` with
    /// equal values.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub target_validation: serde_json::Map<String, Value>,
}

impl ExecutionRequirements {
    /// Create requirements for a resolution type and category.
    pub fn new(resolution_type: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            resolution_type: resolution_type.into(),
            category: category.into(),
            target_validation: serde_json::Map::new(),
        }
    }

    /// Require `key` to appear in the proposed action with `value`.
    pub fn expect_target(mut self, key: impl Into<String>, value: Value) -> Self {
        self.target_validation.insert(key.into(), value);
        self
    }
}

/// Validate a resolution against execution requirements.
///
/// Checks run in a fixed order, first failure wins:
/// 1. status is `Passed`
/// 2. not already executed
/// 3. resolution type matches
/// 4. category matches
/// 5. a proposed-action object exists
/// 6. every required target key matches
/// 7. no active freezing appeal
pub fn validate_for_execution(
    resolution: &Resolution,
    appeals: &[Appeal],
    requirements: &ExecutionRequirements,
) -> Result<(), EligibilityError> {
    if resolution.status != ResolutionStatus::Passed {
        return Err(EligibilityError::WrongStatus {
            status: resolution.status,
        });
    }

    if let Some(executed_at) = resolution.executed_at {
        return Err(EligibilityError::AlreadyExecuted { executed_at });
    }

    if resolution.resolution_type != requirements.resolution_type {
        return Err(EligibilityError::TypeMismatch {
            expected: requirements.resolution_type.clone(),
            actual: resolution.resolution_type.clone(),
        });
    }

    if resolution.category != requirements.category {
        return Err(EligibilityError::CategoryMismatch {
            expected: requirements.category.clone(),
            actual: resolution.category.clone(),
        });
    }

    let proposed = match &resolution.proposed_action {
        Some(Value::Object(map)) => map,
        _ => return Err(EligibilityError::MissingProposedAction),
    };

    for (key, expected) in &requirements.target_validation {
        let matches = proposed
            .get(key)
            .map_or(false, |actual| json_values_equal(expected, actual));
        if !matches {
            return Err(EligibilityError::TargetMismatch {
                key: key.clone(),
                expected: expected.clone(),
            });
        }
    }

    if let Some(blocking) = appeals.iter().find(|a| a.blocks_execution()) {
        return Err(EligibilityError::ExecutionFrozen {
            appeal_id: blocking.appeal_id,
            status: blocking.status,
        });
    }

    Ok(())
}

/// Strict JSON equality with one coercion: numbers compare by numeric
/// value, so `42` equals `42.0`. Values of different JSON types are never
/// equal; `"42"` does not equal `42`.
fn json_values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

// =============================================================================
// TESTS
// =============================================================================
