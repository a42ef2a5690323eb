//! Sangha Test Utilities
//!
//! Centralized test infrastructure for the sangha workspace:
//! - Proptest generators for all entity types
//! - Pre-built fixtures for common object graphs
//! - Custom assertions for sangha-specific error checking

// Re-export the in-memory store from its source crate
pub use sangha_store::MemoryStore;

// Re-export core types for convenience
pub use sangha_core::{
    new_entity_id, ActionGrants, AdminOverrideLog, Appeal, AppealStatus, AuthenticatedUser,
    AuthzError, AuthzTarget, BaseRole, CommissionRole, Election, ElectionCommission,
    EligibilityError, EntityId, EntityType, LeadershipPosition, MandateError, Member,
    MemberStatus, OrgLevel, PermissionAction, Portfolio, PortfolioPermission, PortfolioType,
    Resolution, ResolutionStatus, Role, StoreError, Timestamp,
};

use chrono::Utc;
use uuid::Uuid;

/// Role name used as the super-admin sentinel across fixtures.
pub const SUPER_ADMIN_ROLE: &str = "super_admin";

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating sangha entity types.

    use super::*;
    use proptest::prelude::*;
    use sangha_core::{MemberId, PortfolioId, ResolutionId};

    // === Identity Generators ===

    /// Generate a random UUID.
    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a timestamp-sortable UUIDv7.
    pub fn arb_entity_id_v7() -> impl Strategy<Value = EntityId> {
        Just(()).prop_map(|_| new_entity_id())
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64)
            .prop_map(|secs| chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now))
    }

    // === Enum Generators ===

    /// Generate an OrgLevel variant.
    pub fn arb_org_level() -> impl Strategy<Value = OrgLevel> {
        prop_oneof![
            Just(OrgLevel::State),
            Just(OrgLevel::District),
            Just(OrgLevel::Tehsil),
        ]
    }

    /// Generate an optional OrgLevel.
    pub fn arb_opt_org_level() -> impl Strategy<Value = Option<OrgLevel>> {
        prop::option::of(arb_org_level())
    }

    /// Generate a MemberStatus variant.
    pub fn arb_member_status() -> impl Strategy<Value = MemberStatus> {
        prop_oneof![
            Just(MemberStatus::Active),
            Just(MemberStatus::Suspended),
            Just(MemberStatus::Resigned),
        ]
    }

    /// Generate a PermissionAction variant.
    pub fn arb_permission_action() -> impl Strategy<Value = PermissionAction> {
        prop_oneof![
            Just(PermissionAction::Read),
            Just(PermissionAction::Write),
            Just(PermissionAction::Execute),
            Just(PermissionAction::Delete),
        ]
    }

    /// Generate an arbitrary grant combination.
    pub fn arb_action_grants() -> impl Strategy<Value = ActionGrants> {
        (0u8..=15).prop_map(ActionGrants::from_bits_truncate)
    }

    /// Generate a PortfolioType variant.
    pub fn arb_portfolio_type() -> impl Strategy<Value = PortfolioType> {
        prop_oneof![
            Just(PortfolioType::Executive),
            Just(PortfolioType::ElectionCommission),
            Just(PortfolioType::Administrative),
        ]
    }

    /// Generate a ResolutionStatus variant.
    pub fn arb_resolution_status() -> impl Strategy<Value = ResolutionStatus> {
        prop_oneof![
            Just(ResolutionStatus::Draft),
            Just(ResolutionStatus::UnderReview),
            Just(ResolutionStatus::Passed),
            Just(ResolutionStatus::Rejected),
            Just(ResolutionStatus::Executed),
            Just(ResolutionStatus::Withdrawn),
        ]
    }

    /// Generate an AppealStatus variant.
    pub fn arb_appeal_status() -> impl Strategy<Value = AppealStatus> {
        prop_oneof![
            Just(AppealStatus::Filed),
            Just(AppealStatus::Admitted),
            Just(AppealStatus::UnderReview),
            Just(AppealStatus::Dismissed),
            Just(AppealStatus::Upheld),
            Just(AppealStatus::Withdrawn),
        ]
    }

    /// Generate a CommissionRole variant.
    pub fn arb_commission_role() -> impl Strategy<Value = CommissionRole> {
        prop_oneof![
            Just(CommissionRole::ChiefCommissioner),
            Just(CommissionRole::AssistantCommissioner),
            Just(CommissionRole::ElectionOfficer),
            Just(CommissionRole::EcSecretary),
            Just(CommissionRole::Commissioner),
        ]
    }

    // === String Generators ===

    /// Generate a dotted permission key, e.g. `member.approve`.
    pub fn arb_permission_key() -> impl Strategy<Value = String> {
        ("[a-z]{3,10}", "[a-z]{3,10}").prop_map(|(resource, verb)| format!("{resource}.{verb}"))
    }

    /// Generate a raw role string in the shapes the identity layer produces.
    pub fn arb_role_string() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("super_admin".to_string()),
            Just("member".to_string()),
            ("(state|district|tehsil)", "(_admin|_president|_secretary)")
                .prop_map(|(level, suffix)| format!("{level}{suffix}")),
            "[a-z_]{1,24}",
        ]
    }

    // === Struct Generators ===

    /// Generate a Member.
    pub fn arb_member() -> impl Strategy<Value = Member> {
        (
            arb_entity_id_v7(),
            "[A-Z][a-z]{2,12} [A-Z][a-z]{2,12}",
            "[A-Z]{2}-[0-9]{4}",
            arb_member_status(),
            prop::option::of(arb_entity_id()),
            arb_timestamp(),
        )
            .prop_map(
                |(member_id, full_name, membership_no, status, tehsil_id, joined_at)| Member {
                    member_id,
                    full_name,
                    membership_no,
                    status,
                    tehsil_id,
                    joined_at,
                },
            )
    }

    /// Generate a Portfolio.
    pub fn arb_portfolio() -> impl Strategy<Value = Portfolio> {
        (
            arb_entity_id_v7(),
            "[A-Z]{2,6}(_[A-Z]{2,10}){0,2}",
            "[A-Z][a-z]{2,12}( [A-Z][a-z]{2,12}){0,2}",
            arb_portfolio_type(),
            arb_org_level(),
            0i16..100,
        )
            .prop_map(
                |(portfolio_id, code, name, portfolio_type, level_scope, rank)| Portfolio {
                    portfolio_id,
                    code,
                    name,
                    portfolio_type,
                    level_scope,
                    rank,
                },
            )
    }

    /// Generate a LeadershipPosition for a given member and portfolio.
    pub fn arb_position(
        member_id: MemberId,
        portfolio_id: PortfolioId,
    ) -> impl Strategy<Value = LeadershipPosition> {
        (
            arb_entity_id_v7(),
            arb_org_level(),
            prop::option::of(arb_entity_id()),
            any::<bool>(),
            any::<bool>(),
            arb_timestamp(),
            0i64..1000,
        )
            .prop_map(
                move |(
                    position_id,
                    level,
                    entity_id,
                    is_current,
                    active_portfolio,
                    started_at,
                    action_count,
                )| {
                    LeadershipPosition {
                        position_id,
                        member_id,
                        portfolio_id,
                        level,
                        entity_id,
                        is_current,
                        active_portfolio,
                        started_at,
                        ended_at: None,
                        action_count,
                        last_accessed_at: None,
                    }
                },
            )
    }

    /// Generate a Resolution.
    pub fn arb_resolution() -> impl Strategy<Value = Resolution> {
        (
            arb_entity_id_v7(),
            "[A-Z][a-z ]{4,40}",
            "(disciplinary|financial|organizational)",
            "[a-z_]{4,20}",
            arb_resolution_status(),
            prop::option::of(arb_proposed_action()),
            arb_timestamp(),
        )
            .prop_map(
                |(
                    resolution_id,
                    title,
                    resolution_type,
                    category,
                    status,
                    proposed_action,
                    created_at,
                )| {
                    Resolution {
                        resolution_id,
                        title,
                        resolution_type,
                        category,
                        status,
                        proposed_action,
                        passed_at: (status == ResolutionStatus::Passed).then_some(created_at),
                        executed_by: None,
                        executed_at: None,
                        execution_notes: None,
                        created_at,
                    }
                },
            )
    }

    /// Generate a small JSON object suitable as a proposed action.
    pub fn arb_proposed_action() -> impl Strategy<Value = serde_json::Value> {
        prop::collection::btree_map("[a-z_]{1,10}", -1000i64..1000, 0..5).prop_map(|entries| {
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::json!(v)))
                    .collect(),
            )
        })
    }

    /// Generate an Appeal against a given resolution.
    pub fn arb_appeal(resolution_id: ResolutionId) -> impl Strategy<Value = Appeal> {
        (
            arb_entity_id_v7(),
            arb_appeal_status(),
            any::<bool>(),
            prop::option::of(arb_entity_id()),
            arb_timestamp(),
        )
            .prop_map(
                move |(appeal_id, status, freezes_execution, filed_by, filed_at)| Appeal {
                    appeal_id,
                    resolution_id,
                    status,
                    freezes_execution,
                    filed_by,
                    filed_at,
                },
            )
    }

    /// Generate a parsed Role from an arbitrary raw string.
    pub fn arb_role() -> impl Strategy<Value = Role> {
        arb_role_string().prop_map(|raw| Role::parse(&raw, SUPER_ADMIN_ROLE))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common testing scenarios.

    use super::*;

    /// Create an active member with a tehsil link.
    pub fn member() -> Member {
        Member::new("Asha Verma", "MH-2201").with_tehsil_id(new_entity_id())
    }

    /// Create an executive portfolio scoped to a level.
    pub fn executive_portfolio(level: OrgLevel) -> Portfolio {
        let (code, name) = match level {
            OrgLevel::State => ("STATE_PRESIDENT", "State President"),
            OrgLevel::District => ("DIST_PRESIDENT", "District President"),
            OrgLevel::Tehsil => ("TEHSIL_PRESIDENT", "Tehsil President"),
        };
        Portfolio::new(code, name, PortfolioType::Executive, level)
    }

    /// Create an Election-Commission portfolio with the given code.
    pub fn ec_portfolio(code: &str, level: OrgLevel) -> Portfolio {
        Portfolio::new(
            code,
            "Election Commission Portfolio",
            PortfolioType::ElectionCommission,
            level,
        )
    }

    /// Create a current, active position holding a portfolio.
    pub fn active_position(member: &Member, portfolio: &Portfolio) -> LeadershipPosition {
        LeadershipPosition::new(member.member_id, portfolio.portfolio_id, portfolio.level_scope)
            .with_active_portfolio(true)
    }

    /// Create a current but dormant position holding a portfolio.
    pub fn dormant_position(member: &Member, portfolio: &Portfolio) -> LeadershipPosition {
        LeadershipPosition::new(member.member_id, portfolio.portfolio_id, portfolio.level_scope)
    }

    /// Create an execute grant on a portfolio for a permission key.
    pub fn execute_grant(portfolio: &Portfolio, permission_key: &str) -> PortfolioPermission {
        PortfolioPermission::new(
            portfolio.portfolio_id,
            permission_key,
            permission_key.split('.').next().unwrap_or("resource"),
            ActionGrants::EXECUTE,
        )
    }

    /// Create a passed disciplinary resolution proposing a member suspension.
    pub fn passed_resolution() -> Resolution {
        Resolution::new("Suspend member 42", "disciplinary", "member_suspension")
            .with_status(ResolutionStatus::Passed)
            .with_proposed_action(serde_json::json!({ "member_id": 42 }))
    }

    /// Create an under-review appeal that freezes execution of a resolution.
    pub fn freezing_appeal(resolution_id: EntityId) -> Appeal {
        Appeal::new(resolution_id)
            .with_status(AppealStatus::UnderReview)
            .with_freezes_execution(true)
    }

    /// Create an authenticated user linked to a member.
    pub fn user_for(member: &Member, role: &str) -> AuthenticatedUser {
        let mut user = AuthenticatedUser::new(new_entity_id(), Role::parse(role, SUPER_ADMIN_ROLE))
            .with_member_id(member.member_id);
        if let Some(tehsil_id) = member.tehsil_id {
            user = user.with_tehsil_id(tehsil_id);
        }
        user
    }

    /// Create a district admin with no member link.
    pub fn district_admin() -> AuthenticatedUser {
        AuthenticatedUser::new(new_entity_id(), Role::parse("district_admin", SUPER_ADMIN_ROLE))
    }

    /// Create a super admin with no member link.
    pub fn super_admin() -> AuthenticatedUser {
        AuthenticatedUser::new(
            new_entity_id(),
            Role::parse(SUPER_ADMIN_ROLE, SUPER_ADMIN_ROLE),
        )
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion helpers for sangha-specific validation.

    use super::*;

    /// Assert that a result is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug, E: std::fmt::Debug>(result: &Result<T, E>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a result is an authorization denial carrying the key.
    #[track_caller]
    pub fn assert_denied<T: std::fmt::Debug>(result: &Result<T, AuthzError>, key: &str) {
        match result {
            Err(AuthzError::Denied { permission_key, .. }) => {
                assert_eq!(permission_key, key, "Wrong permission key in denial");
            }
            other => panic!("Expected Denied for '{}', got: {:?}", key, other),
        }
    }

    /// Assert that a mandate result failed for lack of an active position.
    #[track_caller]
    pub fn assert_no_active_position<T: std::fmt::Debug>(result: &Result<T, MandateError>) {
        match result {
            Err(MandateError::NoActivePosition) => {}
            other => panic!("Expected NoActivePosition, got: {:?}", other),
        }
    }

    /// Assert that an eligibility result failed as already executed.
    #[track_caller]
    pub fn assert_already_executed(result: &Result<(), EligibilityError>) {
        match result {
            Err(EligibilityError::AlreadyExecuted { .. }) => {}
            other => panic!("Expected AlreadyExecuted, got: {:?}", other),
        }
    }

    /// Assert that an eligibility result failed as frozen by an appeal.
    #[track_caller]
    pub fn assert_frozen(result: &Result<(), EligibilityError>) {
        match result {
            Err(EligibilityError::ExecutionFrozen { .. }) => {}
            other => panic!("Expected ExecutionFrozen, got: {:?}", other),
        }
    }
}
