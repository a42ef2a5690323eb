//! Request and Response Types for the Sangha API
//!
//! DTOs for the REST endpoints. Domain types (grants, effective levels,
//! eligibility errors) come from the core crates; the types here only shape
//! the HTTP bodies around them.

use sangha_authz::{AuthzGrant, AuthzRequest};
use sangha_core::{AuthzTarget, OrgLevel, PermissionAction};
use sangha_mandate::ExecutionRequirements;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// AUTHORIZATION TYPES
// ============================================================================

/// Request body for POST /api/v1/authz/check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthzCheckRequest {
    /// Permission key to check, e.g. `member.approve`.
    pub permission_key: String,

    /// Action kind; defaults to `execute` when omitted.
    #[serde(default)]
    pub action: Option<PermissionAction>,

    /// Pin the check to a level instead of deriving it from the target.
    #[serde(default)]
    pub level: Option<OrgLevel>,

    /// What the action would touch; recorded on override audit rows.
    #[serde(default)]
    pub target: Option<AuthzTarget>,

    /// Justification recorded when the request is granted by override.
    #[serde(default)]
    pub justification: Option<String>,
}

impl AuthzCheckRequest {
    /// Convert into the gate's request type, stamping the caller address.
    pub fn into_authz_request(self, ip_address: Option<String>) -> AuthzRequest {
        AuthzRequest {
            permission_key: self.permission_key,
            action: self.action.unwrap_or(PermissionAction::Execute),
            level: self.level,
            target: self.target,
            justification: self.justification,
            ip_address,
        }
    }
}

/// Response body for POST /api/v1/authz/check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthzCheckResponse {
    /// Always true in a 200 response; denials surface as 403.
    pub granted: bool,

    /// How the request was granted.
    pub grant: AuthzGrant,
}

/// Request body for POST /api/v1/authz/switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SwitchPortfolioRequest {
    /// Position to make the caller's active portfolio.
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub position_id: Uuid,
}

/// Response body for POST /api/v1/authz/switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SwitchPortfolioResponse {
    pub switched: bool,
}

/// Response body for GET /api/v1/authz/routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoutesResponse {
    /// Accessible route names, sorted and deduplicated.
    pub routes: Vec<String>,
    pub total: i32,
}

// ============================================================================
// RESOLUTION TYPES
// ============================================================================

/// Request body for POST /api/v1/resolutions/{id}/validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidateResolutionRequest {
    /// Required resolution type, e.g. `disciplinary`.
    pub resolution_type: String,

    /// Required category, e.g. `member_suspension`.
    pub category: String,

    /// Keys that must appear in the resolution's proposed action with
    /// equal values. Optional; defaults to no target requirements.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub target_validation: serde_json::Map<String, serde_json::Value>,
}

impl ValidateResolutionRequest {
    /// Convert into the mandate crate's requirements type.
    pub fn into_requirements(self) -> ExecutionRequirements {
        ExecutionRequirements {
            resolution_type: self.resolution_type,
            category: self.category,
            target_validation: self.target_validation,
        }
    }
}

/// Response body for POST /api/v1/resolutions/{id}/validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidateResolutionResponse {
    /// Whether the resolution passes every eligibility check right now.
    pub valid: bool,

    /// Reason of the first failing check, when `valid` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
