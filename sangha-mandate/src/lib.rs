//! SANGHA Mandate - Resolution-Gated Execution
//!
//! Consequential actions in the union (suspensions, dissolutions, fund
//! releases) may only run under the authority of a passed resolution. This
//! crate provides the gate:
//!
//! - `ExecutionRequirements`: what the caller claims to be executing, matched
//!   against the resolution's type, category, and proposed-action targets
//! - `validate_for_execution`: the ordered eligibility checks, including the
//!   appeal freeze
//! - `execute_with_resolution`: runs an action and stamps the resolution
//!   executed in one transaction; any failure rolls both back
//!
//! Eligibility re-runs inside the execution transaction, so a resolution can
//! be executed at most once even under concurrent attempts.

mod eligibility;
mod execute;

pub use eligibility::{validate_for_execution, ExecutionRequirements};
pub use execute::execute_with_resolution;

// Re-export core types for convenience
pub use sangha_core::{
    Appeal, AppealStatus, EligibilityError, MandateError, Resolution, ResolutionStatus,
};
