//! Caller-facing authorization gate
//!
//! Wraps the portfolio service with the admin-override fallback and the
//! effective-level and hierarchy checks. Portfolio grants succeed silently;
//! overrides always leave one audit row. A failed audit write is logged and
//! swallowed so it can never undo an authorization that already succeeded.

use crate::service::PortfolioAuthorizationService;
use sangha_core::{
    AdminOverrideLog, AuthenticatedUser, AuthzConfig, AuthzError, AuthzTarget, EntityId, OrgLevel,
    PermissionAction, PositionId,
};
use sangha_store::{DirectoryStore, StoreResult};
use serde::{Deserialize, Serialize};

/// Target type recorded on audit rows when the request named none.
const UNSPECIFIED_TARGET: &str = "unspecified";

// ============================================================================
// REQUEST / GRANT TYPES
// ============================================================================

/// One authorization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthzRequest {
    /// Dotted permission key, e.g. `member.approve`.
    pub permission_key: String,
    pub action: PermissionAction,
    /// Level to pin the check to; derived from the target when absent.
    pub level: Option<OrgLevel>,
    pub target: Option<AuthzTarget>,
    /// Override justification; the configured default applies when empty.
    pub justification: Option<String>,
    pub ip_address: Option<String>,
}

impl AuthzRequest {
    /// Create a request for a permission key and action.
    pub fn new(permission_key: impl Into<String>, action: PermissionAction) -> Self {
        Self {
            permission_key: permission_key.into(),
            action,
            level: None,
            target: None,
            justification: None,
            ip_address: None,
        }
    }

    /// Pin the check to a level.
    pub fn with_level(mut self, level: OrgLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Attach the target being acted on.
    pub fn with_target(mut self, target: AuthzTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the override justification.
    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }

    /// Set the requester IP for the audit trail.
    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// The level the check runs at: explicit, else taken from the target.
    fn check_level(&self) -> Option<OrgLevel> {
        self.level
            .or_else(|| self.target.as_ref().and_then(|t| t.level))
    }
}

/// How an authorization was granted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum AuthzGrant {
    /// Granted through the active portfolio's permission row.
    Portfolio {
        #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
        position_id: PositionId,
    },
    /// Granted through the admin-override fallback; one audit row written.
    AdminOverride,
}

// ============================================================================
// EFFECTIVE LEVEL
// ============================================================================

/// Where an effective level was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EffectiveLevelSource {
    /// Taken from the active position.
    ActivePortfolio,
    /// Taken from the parsed role string.
    Role,
    /// Fell back to the user's own tehsil.
    TehsilFallback,
}

/// The organizational level a user currently operates at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EffectiveLevel {
    pub level: Option<OrgLevel>,
    /// Organizational unit at that level, when one is known.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub entity_id: Option<EntityId>,
    pub via: EffectiveLevelSource,
}

// ============================================================================
// GATE
// ============================================================================

/// Authorization entry point for request handlers.
pub struct AuthorizationGate<S> {
    service: PortfolioAuthorizationService<S>,
    config: AuthzConfig,
}

impl<S: DirectoryStore> AuthorizationGate<S> {
    /// Create a gate over a service.
    pub fn new(service: PortfolioAuthorizationService<S>, config: AuthzConfig) -> Self {
        Self { service, config }
    }

    /// Access the wrapped portfolio service.
    pub fn service(&self) -> &PortfolioAuthorizationService<S> {
        &self.service
    }

    /// Access the gate configuration.
    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }

    /// Authorize one request.
    ///
    /// The portfolio path is tried first and succeeds silently. When it
    /// cannot grant, the admin-override fallback applies: super-admins
    /// anywhere, level-scoped admins at their own level, every override
    /// recorded in the audit log. Anything else is a denial carrying the
    /// permission key and action.
    pub fn authorize(
        &self,
        user: &AuthenticatedUser,
        request: &AuthzRequest,
    ) -> Result<AuthzGrant, AuthzError> {
        let level = request.check_level();

        if let Some(member_id) = user.member_id {
            if let Some(position) = self.service.active_position(member_id)? {
                let level_matches = level.map_or(true, |l| position.level == l);
                if level_matches
                    && self.service.position_allows(
                        &position,
                        &request.permission_key,
                        request.action,
                    )?
                {
                    return Ok(AuthzGrant::Portfolio {
                        position_id: position.position_id,
                    });
                }
            }
        }

        if user.role.can_override_at(level) {
            self.log_override(user, request);
            return Ok(AuthzGrant::AdminOverride);
        }

        Err(AuthzError::Denied {
            permission_key: request.permission_key.clone(),
            action: request.action,
        })
    }

    /// Write the audit row for a granted override. Failure is logged and
    /// swallowed; the override stands.
    fn log_override(&self, user: &AuthenticatedUser, request: &AuthzRequest) {
        let action_type = format!("{}:{}", request.permission_key, request.action);
        let target_type = request
            .target
            .as_ref()
            .map(|t| t.target_type.clone())
            .unwrap_or_else(|| UNSPECIFIED_TARGET.to_string());
        let justification = request
            .justification
            .as_deref()
            .filter(|j| !j.trim().is_empty())
            .unwrap_or(&self.config.default_override_justification)
            .to_string();

        let mut log = AdminOverrideLog::new(user.user_id, action_type, target_type, justification);
        if let Some(target) = &request.target {
            if let Some(target_id) = target.target_id {
                log = log.with_target_id(target_id);
            }
            if let Some(title) = &target.title {
                log = log.with_target_title(title.clone());
            }
        }
        if let Some(ip) = &request.ip_address {
            log = log.with_ip_address(ip.clone());
        }

        if let Err(error) = self.service.store().override_log_insert(&log) {
            tracing::error!(
                admin_user_id = %user.user_id,
                action_type = %log.action_type,
                %error,
                "failed to write admin override audit record"
            );
        }
    }

    /// The level the user operates at, with its origin: the active
    /// position's level and unit, else the parsed role's level, else the
    /// tehsil fallback with the user's own tehsil (possibly none).
    pub fn effective_level(&self, user: &AuthenticatedUser) -> StoreResult<EffectiveLevel> {
        if let Some(member_id) = user.member_id {
            if let Some(position) = self.service.active_position(member_id)? {
                return Ok(EffectiveLevel {
                    level: Some(position.level),
                    entity_id: position.entity_id,
                    via: EffectiveLevelSource::ActivePortfolio,
                });
            }
        }

        if let Some(level) = user.role.level {
            return Ok(EffectiveLevel {
                level: Some(level),
                entity_id: None,
                via: EffectiveLevelSource::Role,
            });
        }

        Ok(EffectiveLevel {
            level: Some(OrgLevel::Tehsil),
            entity_id: user.tehsil_id,
            via: EffectiveLevelSource::TehsilFallback,
        })
    }

    /// True iff the user's effective level ranks at or above `target_level`.
    /// Absent levels rank 0, so every user clears an unknown target.
    pub fn has_hierarchical_authority(
        &self,
        user: &AuthenticatedUser,
        target_level: Option<OrgLevel>,
    ) -> StoreResult<bool> {
        let effective = self.effective_level(user)?;
        Ok(OrgLevel::rank_of(effective.level) >= OrgLevel::rank_of(target_level))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sangha_test_utils::assertions::assert_denied;
    use sangha_test_utils::{fixtures, MemoryStore, Role, SUPER_ADMIN_ROLE};

    fn gate() -> AuthorizationGate<MemoryStore> {
        AuthorizationGate::new(
            PortfolioAuthorizationService::new(MemoryStore::new()),
            AuthzConfig::default(),
        )
    }

    /// Gate over a store seeded with one member holding an active district
    /// position granted EXECUTE on `member.approve`.
    fn seeded_gate() -> (AuthorizationGate<MemoryStore>, AuthenticatedUser) {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let portfolio = fixtures::executive_portfolio(OrgLevel::District);
        let position = fixtures::active_position(&member, &portfolio);
        store.member_insert(&member).unwrap();
        store.portfolio_insert(&portfolio).unwrap();
        store.position_insert(&position).unwrap();
        store
            .permission_insert(&fixtures::execute_grant(&portfolio, "member.approve"))
            .unwrap();
        let user = fixtures::user_for(&member, "member");
        let gate = AuthorizationGate::new(
            PortfolioAuthorizationService::new(store),
            AuthzConfig::default(),
        );
        (gate, user)
    }

    // ===== Authorize Tests =====

    #[test]
    fn test_portfolio_grant_is_silent() {
        let (gate, user) = seeded_gate();
        let request = AuthzRequest::new("member.approve", PermissionAction::Execute);

        let grant = gate.authorize(&user, &request).unwrap();
        assert!(matches!(grant, AuthzGrant::Portfolio { .. }));

        let logs = gate
            .service()
            .store()
            .override_log_list_by_admin(user.user_id)
            .unwrap();
        assert!(logs.is_empty(), "portfolio grants must not write audit rows");
    }

    #[test]
    fn test_portfolio_grant_respects_level_pin() {
        let (gate, user) = seeded_gate();
        let request = AuthzRequest::new("member.approve", PermissionAction::Execute)
            .with_level(OrgLevel::State);
        // Active position sits at district; the state pin forces the
        // override path, which a plain member fails.
        let result = gate.authorize(&user, &request);
        assert_denied(&result, "member.approve");
    }

    #[test]
    fn test_admin_override_writes_exactly_one_log() {
        let gate = gate();
        let admin = fixtures::district_admin();
        let request = AuthzRequest::new("member.approve", PermissionAction::Execute)
            .with_level(OrgLevel::District);

        let grant = gate.authorize(&admin, &request).unwrap();
        assert_eq!(grant, AuthzGrant::AdminOverride);

        let logs = gate
            .service()
            .store()
            .override_log_list_by_admin(admin.user_id)
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action_type, "member.approve:execute");
        assert_eq!(
            logs[0].justification,
            AuthzConfig::default().default_override_justification
        );
    }

    #[test]
    fn test_override_requires_matching_level() {
        let gate = gate();
        let admin = fixtures::district_admin();
        let request = AuthzRequest::new("member.approve", PermissionAction::Execute)
            .with_level(OrgLevel::State);
        let result = gate.authorize(&admin, &request);
        assert_denied(&result, "member.approve");
    }

    #[test]
    fn test_override_without_level_denied_for_scoped_admins() {
        let gate = gate();
        let admin = fixtures::district_admin();
        let request = AuthzRequest::new("member.approve", PermissionAction::Execute);
        let result = gate.authorize(&admin, &request);
        assert_denied(&result, "member.approve");
    }

    #[test]
    fn test_super_admin_overrides_any_level() {
        let gate = gate();
        let admin = fixtures::super_admin();
        for level in [OrgLevel::State, OrgLevel::District, OrgLevel::Tehsil] {
            let request =
                AuthzRequest::new("election.create", PermissionAction::Execute).with_level(level);
            assert_eq!(
                gate.authorize(&admin, &request).unwrap(),
                AuthzGrant::AdminOverride
            );
        }
    }

    #[test]
    fn test_level_derived_from_target() {
        let (gate, user) = seeded_gate();
        let request = AuthzRequest::new("member.approve", PermissionAction::Execute)
            .with_target(AuthzTarget::new("member").with_level(OrgLevel::District));
        let grant = gate.authorize(&user, &request).unwrap();
        assert!(matches!(grant, AuthzGrant::Portfolio { .. }));

        // Same request against a state-level target fails both paths.
        let request = AuthzRequest::new("member.approve", PermissionAction::Execute)
            .with_target(AuthzTarget::new("member").with_level(OrgLevel::State));
        let result = gate.authorize(&user, &request);
        assert_denied(&result, "member.approve");
    }

    #[test]
    fn test_override_log_captures_target_and_ip() {
        let gate = gate();
        let admin = fixtures::super_admin();
        let target_id = sangha_core::new_entity_id();
        let request = AuthzRequest::new("member.suspend", PermissionAction::Execute)
            .with_target(
                AuthzTarget::new("member")
                    .with_target_id(target_id)
                    .with_title("Member #42"),
            )
            .with_justification("Emergency suspension")
            .with_ip_address("10.0.0.7");

        gate.authorize(&admin, &request).unwrap();

        let logs = gate
            .service()
            .store()
            .override_log_list_by_admin(admin.user_id)
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].target_type, "member");
        assert_eq!(logs[0].target_id, Some(target_id));
        assert_eq!(logs[0].target_title.as_deref(), Some("Member #42"));
        assert_eq!(logs[0].justification, "Emergency suspension");
        assert_eq!(logs[0].ip_address.as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn test_blank_justification_falls_back_to_default() {
        let gate = gate();
        let admin = fixtures::super_admin();
        let request = AuthzRequest::new("member.suspend", PermissionAction::Execute)
            .with_justification("   ");

        gate.authorize(&admin, &request).unwrap();

        let logs = gate
            .service()
            .store()
            .override_log_list_by_admin(admin.user_id)
            .unwrap();
        assert_eq!(
            logs[0].justification,
            AuthzConfig::default().default_override_justification
        );
    }

    #[test]
    fn test_denied_when_no_grant_and_no_override() {
        let (gate, user) = seeded_gate();
        let request = AuthzRequest::new("member.suspend", PermissionAction::Execute);
        let result = gate.authorize(&user, &request);
        assert_denied(&result, "member.suspend");

        let logs = gate
            .service()
            .store()
            .override_log_list_by_admin(user.user_id)
            .unwrap();
        assert!(logs.is_empty());
    }

    // ===== Effective Level Tests =====

    #[test]
    fn test_effective_level_prefers_active_position() {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let portfolio = fixtures::executive_portfolio(OrgLevel::District);
        let unit = sangha_core::new_entity_id();
        let position = fixtures::active_position(&member, &portfolio).with_entity_id(unit);
        store.member_insert(&member).unwrap();
        store.portfolio_insert(&portfolio).unwrap();
        store.position_insert(&position).unwrap();
        // Role carries state; the position must still win.
        let user = fixtures::user_for(&member, "state_president");

        let gate = AuthorizationGate::new(
            PortfolioAuthorizationService::new(store),
            AuthzConfig::default(),
        );
        let effective = gate.effective_level(&user).unwrap();
        assert_eq!(effective.level, Some(OrgLevel::District));
        assert_eq!(effective.entity_id, Some(unit));
        assert_eq!(effective.via, EffectiveLevelSource::ActivePortfolio);
    }

    #[test]
    fn test_effective_level_falls_back_to_role() {
        let gate = gate();
        let user = AuthenticatedUser::new(
            sangha_core::new_entity_id(),
            Role::parse("state_president", SUPER_ADMIN_ROLE),
        );
        let effective = gate.effective_level(&user).unwrap();
        assert_eq!(effective.level, Some(OrgLevel::State));
        assert_eq!(effective.entity_id, None);
        assert_eq!(effective.via, EffectiveLevelSource::Role);
    }

    #[test]
    fn test_effective_level_tehsil_fallback() {
        let gate = gate();
        let tehsil_id = sangha_core::new_entity_id();
        let user = AuthenticatedUser::new(
            sangha_core::new_entity_id(),
            Role::parse("member", SUPER_ADMIN_ROLE),
        )
        .with_tehsil_id(tehsil_id);

        let effective = gate.effective_level(&user).unwrap();
        assert_eq!(effective.level, Some(OrgLevel::Tehsil));
        assert_eq!(effective.entity_id, Some(tehsil_id));
        assert_eq!(effective.via, EffectiveLevelSource::TehsilFallback);

        // Without a tehsil link the level still falls back, unit unknown.
        let bare = AuthenticatedUser::new(
            sangha_core::new_entity_id(),
            Role::parse("member", SUPER_ADMIN_ROLE),
        );
        let effective = gate.effective_level(&bare).unwrap();
        assert_eq!(effective.level, Some(OrgLevel::Tehsil));
        assert_eq!(effective.entity_id, None);
    }

    // ===== Hierarchy Tests =====

    #[test]
    fn test_hierarchical_authority_ranks() {
        let gate = gate();
        let state_user = AuthenticatedUser::new(
            sangha_core::new_entity_id(),
            Role::parse("state_president", SUPER_ADMIN_ROLE),
        );
        assert!(gate
            .has_hierarchical_authority(&state_user, Some(OrgLevel::District))
            .unwrap());
        assert!(gate
            .has_hierarchical_authority(&state_user, Some(OrgLevel::State))
            .unwrap());

        let tehsil_user = AuthenticatedUser::new(
            sangha_core::new_entity_id(),
            Role::parse("member", SUPER_ADMIN_ROLE),
        );
        assert!(!gate
            .has_hierarchical_authority(&tehsil_user, Some(OrgLevel::District))
            .unwrap());
        assert!(gate
            .has_hierarchical_authority(&tehsil_user, Some(OrgLevel::Tehsil))
            .unwrap());
        assert!(gate.has_hierarchical_authority(&tehsil_user, None).unwrap());
    }
}
