//! Portfolio authorization service
//!
//! Answers "may this user perform permission P as action A" by resolving the
//! member's single active position and checking the static grant table
//! against it. Also owns the switch operation that moves the active flag
//! between a member's positions and the route expansion used to build
//! navigation.

use crate::routes::RouteTable;
use chrono::Utc;
use sangha_core::{
    AuthenticatedUser, EntityType, LeadershipPosition, MemberId, OrgLevel, PermissionAction,
    PositionId, StoreError,
};
use sangha_store::{DirectoryStore, PositionUpdate, StoreResult};
use std::collections::BTreeSet;

/// Permission evaluation through a member's active portfolio.
///
/// All reads and writes go through the [`DirectoryStore`] seam. The service
/// is cheap to construct; share the store handle instead of the service when
/// multiple components need it.
pub struct PortfolioAuthorizationService<S> {
    store: S,
    routes: RouteTable,
}

impl<S: DirectoryStore> PortfolioAuthorizationService<S> {
    /// Create a service with the built-in route table.
    pub fn new(store: S) -> Self {
        Self {
            store,
            routes: RouteTable::with_defaults(),
        }
    }

    /// Replace the route table.
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The position the member currently acts through: current, flagged
    /// active, and not past its end date.
    ///
    /// At most one row should match. If upstream writes have violated that
    /// invariant, the earliest position wins (by `started_at`, then id) and
    /// the ambiguity is logged rather than guessed at.
    pub fn active_position(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Option<LeadershipPosition>> {
        let now = Utc::now();
        let mut live: Vec<LeadershipPosition> = self
            .store
            .position_list_by_member(member_id)?
            .into_iter()
            .filter(|p| p.active_portfolio && p.is_live(now))
            .collect();

        if live.len() > 1 {
            tracing::warn!(
                %member_id,
                active_count = live.len(),
                "member has multiple active portfolios; using earliest"
            );
        }

        live.sort_by_key(|p| (p.started_at, p.position_id));
        Ok(live.into_iter().next())
    }

    /// True iff the user's active portfolio holds a grant for the action
    /// under `permission_key`. Users without a member link or without an
    /// active position can do nothing.
    pub fn user_can(
        &self,
        user: &AuthenticatedUser,
        permission_key: &str,
        action: PermissionAction,
    ) -> StoreResult<bool> {
        let Some(member_id) = user.member_id else {
            return Ok(false);
        };
        let Some(position) = self.active_position(member_id)? else {
            return Ok(false);
        };
        self.position_allows(&position, permission_key, action)
    }

    /// [`user_can`](Self::user_can) with a level pin: the active position
    /// must additionally sit at `level`.
    pub fn user_can_at_level(
        &self,
        user: &AuthenticatedUser,
        permission_key: &str,
        level: OrgLevel,
        action: PermissionAction,
    ) -> StoreResult<bool> {
        let Some(member_id) = user.member_id else {
            return Ok(false);
        };
        let Some(position) = self.active_position(member_id)? else {
            return Ok(false);
        };
        if position.level != level {
            return Ok(false);
        }
        self.position_allows(&position, permission_key, action)
    }

    /// Grant lookup for an already-resolved position.
    pub(crate) fn position_allows(
        &self,
        position: &LeadershipPosition,
        permission_key: &str,
        action: PermissionAction,
    ) -> StoreResult<bool> {
        Ok(self
            .store
            .permission_get(position.portfolio_id, permission_key)?
            .map_or(false, |grant| grant.grants.allows(action)))
    }

    /// Make `position_id` the member's single active portfolio.
    ///
    /// Returns `Ok(false)` without touching any rows when the user has no
    /// member link, the position does not exist, it belongs to another
    /// member, or it is no longer current. The clear-then-set runs inside
    /// one transaction so two concurrent switches cannot leave two active
    /// rows behind.
    pub fn switch_active_portfolio(
        &self,
        user: &AuthenticatedUser,
        position_id: PositionId,
    ) -> StoreResult<bool> {
        let Some(member_id) = user.member_id else {
            return Ok(false);
        };

        self.store.with_transaction(|txn| {
            let Some(target) = txn.position_get(position_id)? else {
                return Ok(false);
            };
            if target.member_id != member_id || !target.is_current {
                return Ok(false);
            }

            for position in txn.position_list_by_member(member_id)? {
                if position.active_portfolio && position.position_id != position_id {
                    txn.position_update(
                        position.position_id,
                        PositionUpdate {
                            active_portfolio: Some(false),
                            ..Default::default()
                        },
                    )?;
                }
            }

            txn.position_update(
                position_id,
                PositionUpdate {
                    active_portfolio: Some(true),
                    last_accessed_at: Some(Utc::now()),
                    ..Default::default()
                },
            )?;
            Ok(true)
        })
    }

    /// Route names reachable through the user's active portfolio, with
    /// `{level}` substituted by the position's level. Empty when there is
    /// no active position.
    pub fn user_routes(&self, user: &AuthenticatedUser) -> StoreResult<BTreeSet<String>> {
        let Some(member_id) = user.member_id else {
            return Ok(BTreeSet::new());
        };
        let Some(position) = self.active_position(member_id)? else {
            return Ok(BTreeSet::new());
        };

        let grants = self
            .store
            .permission_list_by_portfolio(position.portfolio_id)?;
        Ok(self.routes.expand(
            grants.iter().map(|g| g.permission_key.as_str()),
            position.level,
        ))
    }

    /// Count one permission-guarded action against a position and refresh
    /// its access timestamp. Errors only when the position does not exist.
    pub fn record_action(&self, position_id: PositionId) -> StoreResult<()> {
        self.store.with_transaction(|txn| {
            let position = txn.position_get(position_id)?.ok_or(StoreError::NotFound {
                entity_type: EntityType::Position,
                id: position_id,
            })?;
            txn.position_update(
                position_id,
                PositionUpdate {
                    action_count: Some(position.action_count + 1),
                    last_accessed_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sangha_test_utils::{fixtures, ActionGrants, MemoryStore, PortfolioPermission};

    /// Store seeded with one member holding one active district position.
    fn seeded() -> (
        PortfolioAuthorizationService<MemoryStore>,
        AuthenticatedUser,
        LeadershipPosition,
    ) {
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
        (PortfolioAuthorizationService::new(store), user, position)
    }

    // ===== Permission Check Tests =====

    #[test]
    fn test_user_without_member_cannot_act() {
        let (service, _, _) = seeded();
        let user = fixtures::district_admin();
        assert!(!service
            .user_can(&user, "election.create", PermissionAction::Execute)
            .unwrap());
    }

    #[test]
    fn test_active_portfolio_grant_allows() {
        let (service, user, _) = seeded();
        assert!(service
            .user_can(&user, "member.approve", PermissionAction::Execute)
            .unwrap());
    }

    #[test]
    fn test_missing_grant_denies() {
        let (service, user, _) = seeded();
        assert!(!service
            .user_can(&user, "member.suspend", PermissionAction::Execute)
            .unwrap());
    }

    #[test]
    fn test_grant_must_carry_the_action() {
        let (service, user, _) = seeded();
        // The fixture grants EXECUTE only.
        assert!(!service
            .user_can(&user, "member.approve", PermissionAction::Delete)
            .unwrap());
    }

    #[test]
    fn test_no_active_position_denies() {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let portfolio = fixtures::executive_portfolio(OrgLevel::District);
        let position = fixtures::dormant_position(&member, &portfolio);
        store.member_insert(&member).unwrap();
        store.portfolio_insert(&portfolio).unwrap();
        store.position_insert(&position).unwrap();
        store
            .permission_insert(&fixtures::execute_grant(&portfolio, "member.approve"))
            .unwrap();
        let user = fixtures::user_for(&member, "member");

        let service = PortfolioAuthorizationService::new(store);
        assert!(!service
            .user_can(&user, "member.approve", PermissionAction::Execute)
            .unwrap());
    }

    #[test]
    fn test_user_can_at_level_pins_level() {
        let (service, user, _) = seeded();
        assert!(service
            .user_can_at_level(
                &user,
                "member.approve",
                OrgLevel::District,
                PermissionAction::Execute,
            )
            .unwrap());
        assert!(!service
            .user_can_at_level(
                &user,
                "member.approve",
                OrgLevel::State,
                PermissionAction::Execute,
            )
            .unwrap());
    }

    // ===== Active Position Tests =====

    #[test]
    fn test_active_position_ignores_ended_rows() {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let portfolio = fixtures::executive_portfolio(OrgLevel::Tehsil);
        let mut position = fixtures::active_position(&member, &portfolio);
        position.ended_at = Some(Utc::now() - chrono::Duration::days(1));
        store.member_insert(&member).unwrap();
        store.portfolio_insert(&portfolio).unwrap();
        store.position_insert(&position).unwrap();

        let service = PortfolioAuthorizationService::new(store);
        assert!(service.active_position(member.member_id).unwrap().is_none());
    }

    #[test]
    fn test_active_position_ambiguity_resolves_to_earliest() {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let portfolio = fixtures::executive_portfolio(OrgLevel::District);
        let mut older = fixtures::active_position(&member, &portfolio);
        older.started_at = Utc::now() - chrono::Duration::days(30);
        let newer = fixtures::active_position(&member, &portfolio);
        store.member_insert(&member).unwrap();
        store.portfolio_insert(&portfolio).unwrap();
        store.position_insert(&older).unwrap();
        store.position_insert(&newer).unwrap();

        let service = PortfolioAuthorizationService::new(store);
        let resolved = service.active_position(member.member_id).unwrap().unwrap();
        assert_eq!(resolved.position_id, older.position_id);
    }

    // ===== Switch Tests =====

    #[test]
    fn test_switch_activates_target_and_clears_others() {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let district = fixtures::executive_portfolio(OrgLevel::District);
        let state = fixtures::executive_portfolio(OrgLevel::State);
        let active = fixtures::active_position(&member, &district);
        let dormant = fixtures::dormant_position(&member, &state);
        store.member_insert(&member).unwrap();
        store.portfolio_insert(&district).unwrap();
        store.portfolio_insert(&state).unwrap();
        store.position_insert(&active).unwrap();
        store.position_insert(&dormant).unwrap();
        let user = fixtures::user_for(&member, "member");

        let service = PortfolioAuthorizationService::new(store);
        assert!(service
            .switch_active_portfolio(&user, dormant.position_id)
            .unwrap());

        let positions = service
            .store()
            .position_list_by_member(member.member_id)
            .unwrap();
        let switched = positions
            .iter()
            .find(|p| p.position_id == dormant.position_id)
            .unwrap();
        let cleared = positions
            .iter()
            .find(|p| p.position_id == active.position_id)
            .unwrap();
        assert!(switched.active_portfolio);
        assert!(switched.last_accessed_at.is_some());
        assert!(!cleared.active_portfolio);
    }

    #[test]
    fn test_switch_rejects_foreign_position() {
        let (service, user, _) = seeded();
        let other_member = fixtures::member();
        let portfolio = fixtures::executive_portfolio(OrgLevel::State);
        let foreign = fixtures::dormant_position(&other_member, &portfolio);
        service.store().member_insert(&other_member).unwrap();
        service.store().portfolio_insert(&portfolio).unwrap();
        service.store().position_insert(&foreign).unwrap();

        assert!(!service
            .switch_active_portfolio(&user, foreign.position_id)
            .unwrap());
        // The foreign row is untouched and the caller's own active position
        // keeps its flag.
        let reloaded = service
            .store()
            .position_get(foreign.position_id)
            .unwrap()
            .unwrap();
        assert!(!reloaded.active_portfolio);
        assert!(service
            .active_position(user.member_id.unwrap())
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_switch_rejects_missing_position() {
        let (service, user, _) = seeded();
        assert!(!service
            .switch_active_portfolio(&user, sangha_core::new_entity_id())
            .unwrap());
    }

    #[test]
    fn test_switch_rejects_ended_position() {
        let (service, user, position) = seeded();
        service
            .store()
            .position_update(
                position.position_id,
                PositionUpdate {
                    is_current: Some(false),
                    active_portfolio: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!service
            .switch_active_portfolio(&user, position.position_id)
            .unwrap());
    }

    #[test]
    fn test_switch_without_member_link() {
        let (service, _, position) = seeded();
        let admin = fixtures::district_admin();
        assert!(!service
            .switch_active_portfolio(&admin, position.position_id)
            .unwrap());
    }

    #[test]
    fn test_concurrent_switches_leave_single_active() {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let district = fixtures::executive_portfolio(OrgLevel::District);
        let state = fixtures::executive_portfolio(OrgLevel::State);
        let first = fixtures::active_position(&member, &district);
        let second = fixtures::dormant_position(&member, &state);
        store.member_insert(&member).unwrap();
        store.portfolio_insert(&district).unwrap();
        store.portfolio_insert(&state).unwrap();
        store.position_insert(&first).unwrap();
        store.position_insert(&second).unwrap();
        let user = fixtures::user_for(&member, "member");

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let user = user.clone();
            let target = if i % 2 == 0 {
                first.position_id
            } else {
                second.position_id
            };
            handles.push(std::thread::spawn(move || {
                let service = PortfolioAuthorizationService::new(store);
                for _ in 0..10 {
                    service.switch_active_portfolio(&user, target).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let active: Vec<_> = store
            .position_list_by_member(member.member_id)
            .unwrap()
            .into_iter()
            .filter(|p| p.is_current && p.active_portfolio)
            .collect();
        assert_eq!(active.len(), 1, "exactly one active position must remain");
    }

    // ===== Route Expansion Tests =====

    #[test]
    fn test_user_routes_expand_and_dedup() {
        let (service, user, _) = seeded();
        // Second grant whose templates overlap member.approve on
        // "{level}.members.show".
        let portfolio_id = service
            .active_position(user.member_id.unwrap())
            .unwrap()
            .unwrap()
            .portfolio_id;
        service
            .store()
            .permission_insert(&PortfolioPermission::new(
                portfolio_id,
                "member.view",
                "member",
                ActionGrants::READ,
            ))
            .unwrap();

        let routes = service.user_routes(&user).unwrap();
        let expected: BTreeSet<String> = [
            "district.members.approve",
            "district.members.show",
            "district.members.index",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(routes, expected);
    }

    #[test]
    fn test_user_routes_empty_without_active_position() {
        let (service, _, _) = seeded();
        let admin = fixtures::district_admin();
        assert!(service.user_routes(&admin).unwrap().is_empty());
    }

    // ===== Usage Recording Tests =====

    #[test]
    fn test_record_action_increments_counter() {
        let (service, _, position) = seeded();
        service.record_action(position.position_id).unwrap();
        service.record_action(position.position_id).unwrap();

        let reloaded = service
            .store()
            .position_get(position.position_id)
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.action_count, 2);
        assert!(reloaded.last_accessed_at.is_some());
    }

    #[test]
    fn test_record_action_missing_position_errors() {
        let (service, _, _) = seeded();
        let result = service.record_action(sangha_core::new_entity_id());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
