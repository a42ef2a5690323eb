//! Enum types for Sangha entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ORGANIZATIONAL LEVELS
// ============================================================================

/// Organizational level of the union hierarchy.
///
/// Authority is ordered: state covers district covers tehsil. The numeric
/// rank is fixed and used by the hierarchical authority check; an absent
/// level ranks 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum OrgLevel {
    State,
    District,
    Tehsil,
}

impl OrgLevel {
    /// Fixed authority rank: state=3, district=2, tehsil=1.
    pub fn rank(&self) -> u8 {
        match self {
            OrgLevel::State => 3,
            OrgLevel::District => 2,
            OrgLevel::Tehsil => 1,
        }
    }

    /// Rank of an optional level; unknown/absent levels rank 0.
    pub fn rank_of(level: Option<OrgLevel>) -> u8 {
        level.map_or(0, |l| l.rank())
    }

    /// Lowercase name used in route templates and role strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgLevel::State => "state",
            OrgLevel::District => "district",
            OrgLevel::Tehsil => "tehsil",
        }
    }
}

impl fmt::Display for OrgLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrgLevel {
    type Err = OrgLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "state" => Ok(OrgLevel::State),
            "district" => Ok(OrgLevel::District),
            "tehsil" => Ok(OrgLevel::Tehsil),
            _ => Err(OrgLevelParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid organizational level string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgLevelParseError(pub String);

impl fmt::Display for OrgLevelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid organizational level: {}", self.0)
    }
}

impl std::error::Error for OrgLevelParseError {}

// ============================================================================
// MEMBERS
// ============================================================================

/// Standing of a member within the union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Active,
    Suspended,
    Resigned,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Suspended => "suspended",
            MemberStatus::Resigned => "resigned",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ENTITY DISCRIMINATOR
// ============================================================================

/// Entity type discriminator for store diagnostics and polymorphic
/// references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Member,
    Portfolio,
    Position,
    Permission,
    Resolution,
    Appeal,
    Election,
    Commission,
    OverrideLog,
}

// ============================================================================
// PERMISSIONS
// ============================================================================

/// Action kind checked against a portfolio's permission grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Read,
    Write,
    Execute,
    Delete,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Read => "read",
            PermissionAction::Write => "write",
            PermissionAction::Execute => "execute",
            PermissionAction::Delete => "delete",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = PermissionActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(PermissionAction::Read),
            "write" => Ok(PermissionAction::Write),
            "execute" => Ok(PermissionAction::Execute),
            "delete" => Ok(PermissionAction::Delete),
            _ => Err(PermissionActionParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid permission action string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionActionParseError(pub String);

impl fmt::Display for PermissionActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid permission action: {}", self.0)
    }
}

impl std::error::Error for PermissionActionParseError {}

// ============================================================================
// PORTFOLIOS
// ============================================================================

/// Category of a portfolio template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PortfolioType {
    /// Elected executive roles (presidents, secretaries, treasurers).
    Executive,
    /// Election Commission roles; holders are mirrored into per-election
    /// commission membership.
    ElectionCommission,
    /// Appointed administrative roles.
    Administrative,
}

impl PortfolioType {
    pub fn is_election_commission(&self) -> bool {
        matches!(self, PortfolioType::ElectionCommission)
    }
}

// ============================================================================
// RESOLUTIONS
// ============================================================================

/// Status of a resolution.
///
/// Only `Passed` resolutions may be executed, and execution is terminal:
/// `Executed` never transitions anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Draft,
    UnderReview,
    Passed,
    Rejected,
    Executed,
    Withdrawn,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Draft => "draft",
            ResolutionStatus::UnderReview => "under_review",
            ResolutionStatus::Passed => "passed",
            ResolutionStatus::Rejected => "rejected",
            ResolutionStatus::Executed => "executed",
            ResolutionStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// APPEALS
// ============================================================================

/// Status of an appeal against a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    Filed,
    Admitted,
    UnderReview,
    Dismissed,
    Upheld,
    Withdrawn,
}

impl AppealStatus {
    /// An appeal in an active status can freeze execution of its resolution
    /// (when the appeal's `freezes_execution` flag is also set).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppealStatus::Filed | AppealStatus::Admitted | AppealStatus::UnderReview
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppealStatus::Filed => "filed",
            AppealStatus::Admitted => "admitted",
            AppealStatus::UnderReview => "under_review",
            AppealStatus::Dismissed => "dismissed",
            AppealStatus::Upheld => "upheld",
            AppealStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for AppealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ELECTION COMMISSION
// ============================================================================

/// Role a member holds on an election commission.
///
/// Derived from the portfolio code when positions are mirrored into
/// commission membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CommissionRole {
    ChiefCommissioner,
    AssistantCommissioner,
    ElectionOfficer,
    EcSecretary,
    Commissioner,
}

impl CommissionRole {
    /// Map a portfolio code to a commission role. Fragments are checked in
    /// a fixed order and the first match wins; codes matching none of them
    /// fall through to plain Commissioner.
    pub fn from_portfolio_code(code: &str) -> CommissionRole {
        let code = code.to_ascii_uppercase();
        if code.contains("CHIEF") {
            CommissionRole::ChiefCommissioner
        } else if code.contains("ASST") {
            CommissionRole::AssistantCommissioner
        } else if code.contains("OFFICER") {
            CommissionRole::ElectionOfficer
        } else if code.contains("SECRETARY") {
            CommissionRole::EcSecretary
        } else {
            CommissionRole::Commissioner
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            CommissionRole::ChiefCommissioner => "Chief Commissioner",
            CommissionRole::AssistantCommissioner => "Assistant Commissioner",
            CommissionRole::ElectionOfficer => "Election Officer",
            CommissionRole::EcSecretary => "EC Secretary",
            CommissionRole::Commissioner => "Commissioner",
        }
    }
}

impl fmt::Display for CommissionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_level_ranks() {
        assert_eq!(OrgLevel::State.rank(), 3);
        assert_eq!(OrgLevel::District.rank(), 2);
        assert_eq!(OrgLevel::Tehsil.rank(), 1);
        assert_eq!(OrgLevel::rank_of(None), 0);
        assert_eq!(OrgLevel::rank_of(Some(OrgLevel::District)), 2);
    }

    #[test]
    fn test_org_level_parse_roundtrip() {
        for level in [OrgLevel::State, OrgLevel::District, OrgLevel::Tehsil] {
            let parsed: OrgLevel = level.as_str().parse().unwrap();
            assert_eq!(parsed, level);
        }
        assert!("village".parse::<OrgLevel>().is_err());
        assert_eq!(" District ".parse::<OrgLevel>().unwrap(), OrgLevel::District);
    }

    #[test]
    fn test_permission_action_parse() {
        assert_eq!(
            "execute".parse::<PermissionAction>().unwrap(),
            PermissionAction::Execute
        );
        assert_eq!(
            "READ".parse::<PermissionAction>().unwrap(),
            PermissionAction::Read
        );
        assert!("approve".parse::<PermissionAction>().is_err());
    }

    #[test]
    fn test_appeal_status_active_set() {
        assert!(AppealStatus::Filed.is_active());
        assert!(AppealStatus::Admitted.is_active());
        assert!(AppealStatus::UnderReview.is_active());
        assert!(!AppealStatus::Dismissed.is_active());
        assert!(!AppealStatus::Upheld.is_active());
        assert!(!AppealStatus::Withdrawn.is_active());
    }

    #[test]
    fn test_commission_role_from_code_first_match_wins() {
        assert_eq!(
            CommissionRole::from_portfolio_code("EC_CHIEF_COMMISSIONER"),
            CommissionRole::ChiefCommissioner
        );
        assert_eq!(
            CommissionRole::from_portfolio_code("EC_ASST_COMMISSIONER"),
            CommissionRole::AssistantCommissioner
        );
        assert_eq!(
            CommissionRole::from_portfolio_code("EC_ELECTION_OFFICER"),
            CommissionRole::ElectionOfficer
        );
        assert_eq!(
            CommissionRole::from_portfolio_code("EC_SECRETARY"),
            CommissionRole::EcSecretary
        );
        assert_eq!(
            CommissionRole::from_portfolio_code("EC_MEMBER"),
            CommissionRole::Commissioner
        );
        // CHIEF outranks SECRETARY when a code carries both fragments.
        assert_eq!(
            CommissionRole::from_portfolio_code("EC_CHIEF_SECRETARY"),
            CommissionRole::ChiefCommissioner
        );
    }

    #[test]
    fn test_commission_role_code_case_insensitive() {
        assert_eq!(
            CommissionRole::from_portfolio_code("ec_chief"),
            CommissionRole::ChiefCommissioner
        );
    }

    #[test]
    fn test_resolution_status_strings() {
        assert_eq!(ResolutionStatus::Passed.as_str(), "passed");
        assert_eq!(ResolutionStatus::UnderReview.as_str(), "under_review");
        assert_eq!(format!("{}", ResolutionStatus::Executed), "executed");
    }
}
