//! Parsed role and authenticated-user types
//!
//! Role strings arrive from the identity provider as free-form labels like
//! `district_admin` or `state_president`. They are parsed exactly once, at
//! authentication time, into a `Role` carrying a base kind and an optional
//! organizational level. Authorization code only ever looks at the parsed
//! fields, never at the raw string.

use crate::{
    enums::OrgLevel,
    identity::{EntityId, MemberId, UserId},
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First `state`/`district`/`tehsil` fragment in a role string.
static LEVEL_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(state|district|tehsil)").expect("level fragment regex is valid"));

/// Base kind of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BaseRole {
    /// The configured super-admin role; passes every override check.
    SuperAdmin,
    /// A role carrying an `admin` fragment.
    Admin,
    /// Everything else (members, office bearers without admin duties).
    General,
}

/// A role parsed from its raw string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Role {
    pub base: BaseRole,
    /// Level fragment found in the role string, if any.
    pub level: Option<OrgLevel>,
    /// Original string, kept for audit records and diagnostics.
    pub raw: String,
}

impl Role {
    /// Parse a raw role string.
    ///
    /// `super_admin_role` is the configured name of the super-admin role;
    /// comparison is case-insensitive after trimming. The level is the first
    /// level-name fragment found anywhere in the string, so `district_admin`
    /// and `admin_district_north` both map to district.
    pub fn parse(raw: &str, super_admin_role: &str) -> Role {
        let normalized = raw.trim().to_lowercase();

        let base = if normalized == super_admin_role.trim().to_lowercase() {
            BaseRole::SuperAdmin
        } else if normalized.contains("admin") {
            BaseRole::Admin
        } else {
            BaseRole::General
        };

        let level = LEVEL_FRAGMENT
            .find(&normalized)
            .and_then(|m| m.as_str().parse::<OrgLevel>().ok());

        Role {
            base,
            level,
            raw: raw.trim().to_string(),
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.base == BaseRole::SuperAdmin
    }

    /// True when this role can override authorization at the given level:
    /// super-admins always, otherwise only at the role's own level.
    pub fn can_override_at(&self, level: Option<OrgLevel>) -> bool {
        if self.is_super_admin() {
            return true;
        }
        match (self.level, level) {
            (Some(own), Some(requested)) => own == requested,
            _ => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Authenticated caller identity, as handed in by the authentication layer.
///
/// The core never authenticates anyone; it receives this object fully
/// formed, with the role already parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthenticatedUser {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub role: Role,
    /// Linked member record, if the account belongs to a union member.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub member_id: Option<MemberId>,
    /// The user's own tehsil; last resort for effective-level derivation.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub tehsil_id: Option<EntityId>,
}

impl AuthenticatedUser {
    /// Create an identity with a parsed role.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            member_id: None,
            tehsil_id: None,
        }
    }

    /// Link the identity to a member record.
    pub fn with_member_id(mut self, member_id: MemberId) -> Self {
        self.member_id = Some(member_id);
        self
    }

    /// Set the user's tehsil.
    pub fn with_tehsil_id(mut self, tehsil_id: EntityId) -> Self {
        self.tehsil_id = Some(tehsil_id);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
