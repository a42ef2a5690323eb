//! Configuration types

use crate::error::{ConfigError, SanghaError, SanghaResult};
use serde::{Deserialize, Serialize};

/// Authorization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthzConfig {
    /// Name of the role granted unconditional override, compared
    /// case-insensitively against raw role strings at authentication time.
    pub super_admin_role: String,
    /// Justification recorded on override audit rows when the caller
    /// supplies none.
    pub default_override_justification: String,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            super_admin_role: "super_admin".to_string(),
            default_override_justification: "Administrative override".to_string(),
        }
    }
}

impl AuthzConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `SANGHA_SUPER_ADMIN_ROLE`: super-admin role name (default: `super_admin`)
    /// - `SANGHA_OVERRIDE_JUSTIFICATION`: default audit justification
    ///   (default: `Administrative override`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            super_admin_role: std::env::var("SANGHA_SUPER_ADMIN_ROLE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.super_admin_role),
            default_override_justification: std::env::var("SANGHA_OVERRIDE_JUSTIFICATION")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.default_override_justification),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SanghaResult<()> {
        if self.super_admin_role.trim().is_empty() {
            return Err(SanghaError::Config(ConfigError::InvalidValue {
                field: "super_admin_role".to_string(),
                value: self.super_admin_role.clone(),
                reason: "must not be empty".to_string(),
            }));
        }

        if self.default_override_justification.trim().is_empty() {
            return Err(SanghaError::Config(ConfigError::InvalidValue {
                field: "default_override_justification".to_string(),
                value: self.default_override_justification.clone(),
                reason: "must not be empty".to_string(),
            }));
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
