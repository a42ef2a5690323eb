//! Shared Application State
//!
//! One `AppState` is built at startup and cloned into every route. The
//! authorization gate owns its own service (and through it a store handle);
//! the separate `store` field serves routes that read the directory without
//! going through authorization, such as resolution validation and health
//! probes. Both handles share the same underlying tables.

use std::sync::Arc;
use std::time::Instant;

use sangha_authz::{AuthorizationGate, PortfolioAuthorizationService};
use sangha_core::AuthzConfig;
use sangha_store::MemoryStore;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Authorization gate wrapping the portfolio permission service.
    pub gate: Arc<AuthorizationGate<MemoryStore>>,
    /// Direct store handle for non-authorization reads.
    pub store: MemoryStore,
    /// Server start time, for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Build the state from a store and the authorization configuration.
    pub fn new(store: MemoryStore, config: AuthzConfig) -> Self {
        let service = PortfolioAuthorizationService::new(store.clone());
        Self {
            gate: Arc::new(AuthorizationGate::new(service, config)),
            store,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sangha_store::DirectoryStore;

    #[test]
    fn test_clones_share_tables() {
        let store = MemoryStore::new();
        let state = AppState::new(store.clone(), AuthzConfig::default());

        let member = sangha_test_utils::fixtures::member();
        store.member_insert(&member).unwrap();

        // Visible through the gate's store and the state's own handle.
        let via_gate = state.gate.service().store().member_get(member.member_id);
        assert!(via_gate.unwrap().is_some());
        let via_state = state.store.member_get(member.member_id);
        assert!(via_state.unwrap().is_some());
    }
}
