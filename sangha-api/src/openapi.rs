//! OpenAPI Specification for the Sangha API
//!
//! This module defines the OpenAPI document for the Sangha REST API.
//! It uses utoipa to generate the OpenAPI specification from Rust types
//! and route annotations.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::middleware::USER_HEADER;
use crate::types::*;

// Import route modules for path references
use crate::routes::{authz, health, resolution};

// Import domain types exposed through request and response bodies
use sangha_authz::{AuthzGrant, EffectiveLevel, EffectiveLevelSource};
use sangha_core::{AuthzTarget, OrgLevel, PermissionAction};

/// OpenAPI document for the Sangha API.
///
/// Generates the complete specification for the authorization surface,
/// including all schemas, paths, and security definitions.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sangha API",
        version = "0.1.0",
        description = "Portfolio-based authorization, resolution-gated execution, and position lifecycle services for union management platforms",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Authorization", description = "Permission checks, portfolio switching, and effective-level queries"),
        (name = "Resolutions", description = "Eligibility checks for resolution-gated actions"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        // === Authorization Routes ===
        authz::check_authorization,
        authz::switch_portfolio,
        authz::list_user_routes,
        authz::get_effective_level,

        // === Resolution Routes ===
        resolution::validate_resolution,

        // === Health Routes ===
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Authorization Types ===
            AuthzCheckRequest, AuthzCheckResponse,
            SwitchPortfolioRequest, SwitchPortfolioResponse,
            RoutesResponse,

            // === Resolution Types ===
            ValidateResolutionRequest, ValidateResolutionResponse,

            // === Health Types ===
            health::HealthResponse, health::HealthStatus,
            health::HealthDetails, health::ComponentHealth,

            // === Domain Types ===
            AuthzGrant, EffectiveLevel, EffectiveLevelSource,
            AuthzTarget, OrgLevel, PermissionAction,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // Gateway-forwarded identity headers; the user header stands in
            // for the whole set.
            components.add_security_scheme(
                "identity",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_HEADER))),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}
