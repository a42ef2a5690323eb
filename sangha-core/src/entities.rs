//! Core entity structures

use crate::{
    enums::{AppealStatus, CommissionRole, MemberStatus, OrgLevel, PortfolioType, ResolutionStatus},
    grants::ActionGrants,
    identity::{
        new_entity_id, AppealId, CommissionId, ElectionId, EntityId, LogId, MemberId, PortfolioId,
        PositionId, ResolutionId, Timestamp, UserId,
    },
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Member - a person registered with the union.
/// Owns zero-or-many leadership positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Member {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub member_id: MemberId,
    pub full_name: String,
    pub membership_no: String,
    pub status: MemberStatus,
    /// Tehsil the member belongs to; used as the last effective-level fallback.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub tehsil_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub joined_at: Timestamp,
}

impl Member {
    /// Create a new active member.
    pub fn new(full_name: impl Into<String>, membership_no: impl Into<String>) -> Self {
        Self {
            member_id: new_entity_id(),
            full_name: full_name.into(),
            membership_no: membership_no.into(),
            status: MemberStatus::Active,
            tehsil_id: None,
            joined_at: Utc::now(),
        }
    }

    /// Set the member's tehsil.
    pub fn with_tehsil_id(mut self, tehsil_id: EntityId) -> Self {
        self.tehsil_id = Some(tehsil_id);
        self
    }

    /// Set the member's standing.
    pub fn with_status(mut self, status: MemberStatus) -> Self {
        self.status = status;
        self
    }
}

/// Portfolio - a named role template (e.g. "District President").
/// Immutable master data; positions reference it, never own it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Portfolio {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub portfolio_id: PortfolioId,
    /// Uppercase mnemonic, e.g. `DIST_PRESIDENT`, `EC_CHIEF_COMMISSIONER`.
    pub code: String,
    pub name: String,
    pub portfolio_type: PortfolioType,
    /// Level the portfolio operates at.
    pub level_scope: OrgLevel,
    /// Ordering rank among portfolios at the same level (presentation only).
    pub rank: i16,
}

impl Portfolio {
    /// Create a new portfolio template.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        portfolio_type: PortfolioType,
        level_scope: OrgLevel,
    ) -> Self {
        Self {
            portfolio_id: new_entity_id(),
            code: code.into(),
            name: name.into(),
            portfolio_type,
            level_scope,
            rank: 0,
        }
    }

    /// Set the presentation rank.
    pub fn with_rank(mut self, rank: i16) -> Self {
        self.rank = rank;
        self
    }

    /// Commission role this portfolio maps to when mirrored into an
    /// election commission.
    pub fn commission_role(&self) -> CommissionRole {
        CommissionRole::from_portfolio_code(&self.code)
    }
}

/// LeadershipPosition - a member's holding of a portfolio at a level.
///
/// `is_current` distinguishes live positions from soft-ended history;
/// `active_portfolio` marks the single position the member's permissions
/// are currently evaluated through. Invariant: at most one position per
/// member has `active_portfolio = true` among `is_current = true` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LeadershipPosition {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub position_id: PositionId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub member_id: MemberId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub portfolio_id: PortfolioId,
    pub level: OrgLevel,
    /// Organizational unit the position is scoped to (a specific district,
    /// tehsil, or the state body).
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub entity_id: Option<EntityId>,
    pub is_current: bool,
    pub active_portfolio: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub started_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub ended_at: Option<Timestamp>,
    /// Number of permission-guarded actions performed through this position.
    pub action_count: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub last_accessed_at: Option<Timestamp>,
}

impl LeadershipPosition {
    /// Create a new current, inactive position.
    pub fn new(member_id: MemberId, portfolio_id: PortfolioId, level: OrgLevel) -> Self {
        Self {
            position_id: new_entity_id(),
            member_id,
            portfolio_id,
            level,
            entity_id: None,
            is_current: true,
            active_portfolio: false,
            started_at: Utc::now(),
            ended_at: None,
            action_count: 0,
            last_accessed_at: None,
        }
    }

    /// Scope the position to an organizational unit.
    pub fn with_entity_id(mut self, entity_id: EntityId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Mark the position active on creation.
    pub fn with_active_portfolio(mut self, active: bool) -> Self {
        self.active_portfolio = active;
        self
    }

    /// A position is live when current and not past its end date.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.is_current && self.ended_at.map_or(true, |end| end > now)
    }
}

/// PortfolioPermission - one row of the static grant table.
/// Read-only at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PortfolioPermission {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub portfolio_id: PortfolioId,
    /// Dotted permission key, e.g. `member.approve`, `election.create`.
    pub permission_key: String,
    /// Resource kind the key refers to (informational).
    pub resource_type: String,
    pub grants: ActionGrants,
}

impl PortfolioPermission {
    /// Create a grant row for a portfolio.
    pub fn new(
        portfolio_id: PortfolioId,
        permission_key: impl Into<String>,
        resource_type: impl Into<String>,
        grants: ActionGrants,
    ) -> Self {
        Self {
            portfolio_id,
            permission_key: permission_key.into(),
            resource_type: resource_type.into(),
            grants,
        }
    }
}

/// Resolution - a passed organizational decision that authorizes exactly
/// one downstream action.
///
/// Once `executed_at` is set the resolution is terminal for execution
/// purposes; no action may execute against it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Resolution {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub resolution_id: ResolutionId,
    pub title: String,
    /// Free-form kind, e.g. `disciplinary`, `financial` (deployment master data).
    pub resolution_type: String,
    /// Free-form subcategory, e.g. `member_suspension`.
    pub category: String,
    pub status: ResolutionStatus,
    /// Parameters of the action the resolution authorizes. Must be a JSON
    /// object for the resolution to be executable.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub proposed_action: Option<serde_json::Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub passed_at: Option<Timestamp>,
    /// Position that executed the resolution.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub executed_by: Option<PositionId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub executed_at: Option<Timestamp>,
    pub execution_notes: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Resolution {
    /// Create a new draft resolution.
    pub fn new(
        title: impl Into<String>,
        resolution_type: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            resolution_id: new_entity_id(),
            title: title.into(),
            resolution_type: resolution_type.into(),
            category: category.into(),
            status: ResolutionStatus::Draft,
            proposed_action: None,
            passed_at: None,
            executed_by: None,
            executed_at: None,
            execution_notes: None,
            created_at: Utc::now(),
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: ResolutionStatus) -> Self {
        if status == ResolutionStatus::Passed && self.passed_at.is_none() {
            self.passed_at = Some(Utc::now());
        }
        self.status = status;
        self
    }

    /// Set the proposed action parameters.
    pub fn with_proposed_action(mut self, action: serde_json::Value) -> Self {
        self.proposed_action = Some(action);
        self
    }
}

/// Appeal - a challenge filed against a resolution.
///
/// An appeal in an active status with `freezes_execution = true` blocks
/// execution of the resolution it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Appeal {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub appeal_id: AppealId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub resolution_id: ResolutionId,
    pub status: AppealStatus,
    pub freezes_execution: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub filed_by: Option<MemberId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub filed_at: Timestamp,
}

impl Appeal {
    /// File a new appeal against a resolution.
    pub fn new(resolution_id: ResolutionId) -> Self {
        Self {
            appeal_id: new_entity_id(),
            resolution_id,
            status: AppealStatus::Filed,
            freezes_execution: false,
            filed_by: None,
            filed_at: Utc::now(),
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: AppealStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark the appeal as freezing execution while it is active.
    pub fn with_freezes_execution(mut self, freezes: bool) -> Self {
        self.freezes_execution = freezes;
        self
    }

    /// Set the filing member.
    pub fn with_filed_by(mut self, member_id: MemberId) -> Self {
        self.filed_by = Some(member_id);
        self
    }

    /// True when this appeal currently blocks execution of its resolution.
    pub fn blocks_execution(&self) -> bool {
        self.status.is_active() && self.freezes_execution
    }
}

/// AdminOverrideLog - immutable audit record of a fallback authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AdminOverrideLog {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub log_id: LogId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub admin_user_id: UserId,
    /// Permission key and action, formatted as `key:action`.
    pub action_type: String,
    pub target_type: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub target_id: Option<EntityId>,
    pub target_title: Option<String>,
    pub justification: String,
    pub ip_address: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl AdminOverrideLog {
    /// Create an audit record for an admin override.
    pub fn new(
        admin_user_id: UserId,
        action_type: impl Into<String>,
        target_type: impl Into<String>,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            log_id: new_entity_id(),
            admin_user_id,
            action_type: action_type.into(),
            target_type: target_type.into(),
            target_id: None,
            target_title: None,
            justification: justification.into(),
            ip_address: None,
            created_at: Utc::now(),
        }
    }

    /// Set the target entity id.
    pub fn with_target_id(mut self, target_id: EntityId) -> Self {
        self.target_id = Some(target_id);
        self
    }

    /// Set the target title.
    pub fn with_target_title(mut self, title: impl Into<String>) -> Self {
        self.target_title = Some(title.into());
        self
    }

    /// Set the requester IP.
    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }
}

/// Election - master data for one election at one organizational level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Election {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub election_id: ElectionId,
    pub title: String,
    pub level: OrgLevel,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub entity_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub scheduled_on: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Election {
    /// Create a new election at a level.
    pub fn new(title: impl Into<String>, level: OrgLevel) -> Self {
        Self {
            election_id: new_entity_id(),
            title: title.into(),
            level,
            entity_id: None,
            scheduled_on: None,
            created_at: Utc::now(),
        }
    }

    /// Scope the election to an organizational unit.
    pub fn with_entity_id(mut self, entity_id: EntityId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Set the scheduled date.
    pub fn with_scheduled_on(mut self, scheduled_on: Timestamp) -> Self {
        self.scheduled_on = Some(scheduled_on);
        self
    }
}

/// ElectionCommission - mirrored membership row: one per (election, member)
/// pair for members holding an EC-type portfolio. Kept in sync with the
/// position lifecycle, never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ElectionCommission {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub commission_id: CommissionId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub election_id: ElectionId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub member_id: MemberId,
    pub role: CommissionRole,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub appointed_at: Timestamp,
}

impl ElectionCommission {
    /// Appoint a member to an election's commission.
    pub fn new(election_id: ElectionId, member_id: MemberId, role: CommissionRole) -> Self {
        Self {
            commission_id: new_entity_id(),
            election_id,
            member_id,
            role,
            appointed_at: Utc::now(),
        }
    }
}

/// Target of an authorization request. All fields are best-effort; missing
/// ones are tolerated in the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthzTarget {
    pub target_type: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub target_id: Option<EntityId>,
    pub title: Option<String>,
    /// Level the target lives at; used to derive the check level when the
    /// caller does not pass one explicitly.
    pub level: Option<OrgLevel>,
}

impl AuthzTarget {
    /// Create a target reference.
    pub fn new(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            target_id: None,
            title: None,
            level: None,
        }
    }

    /// Set the target id.
    pub fn with_target_id(mut self, id: EntityId) -> Self {
        self.target_id = Some(id);
        self
    }

    /// Set the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the target's level.
    pub fn with_level(mut self, level: OrgLevel) -> Self {
        self.level = Some(level);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
