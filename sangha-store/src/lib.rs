//! SANGHA Store - Storage Trait and In-Memory Implementation
//!
//! Defines the persistence seam for Sangha entities. `DirectoryStore` is the
//! row-level interface the services build on; `StoreTxn` is the mutable view
//! handed to `with_transaction` closures, whose writes commit atomically on
//! `Ok` and roll back completely on `Err`.

pub mod memory;

pub use memory::MemoryStore;

use sangha_core::{
    AdminOverrideLog, Appeal, Election, ElectionCommission, LeadershipPosition, Member,
    MemberStatus, OrgLevel, Portfolio, PortfolioPermission, Resolution, ResolutionStatus,
    StoreError,
};
use sangha_core::{
    CommissionId, ElectionId, EntityId, MemberId, PortfolioId, PositionId, ResolutionId,
    Timestamp, UserId,
};

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for members.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    /// New standing
    pub status: Option<MemberStatus>,
    /// New tehsil
    pub tehsil_id: Option<EntityId>,
}

/// Update payload for leadership positions.
#[derive(Debug, Clone, Default)]
pub struct PositionUpdate {
    /// Whether the position is current
    pub is_current: Option<bool>,
    /// Whether the position is the member's active portfolio
    pub active_portfolio: Option<bool>,
    /// End timestamp (soft end)
    pub ended_at: Option<Timestamp>,
    /// Usage counter
    pub action_count: Option<i64>,
    /// Last access timestamp
    pub last_accessed_at: Option<Timestamp>,
}

/// Update payload for resolutions.
#[derive(Debug, Clone, Default)]
pub struct ResolutionUpdate {
    /// New status
    pub status: Option<ResolutionStatus>,
    /// Proposed action parameters
    pub proposed_action: Option<serde_json::Value>,
    /// Position that executed the resolution
    pub executed_by: Option<PositionId>,
    /// Execution timestamp
    pub executed_at: Option<Timestamp>,
    /// Execution notes
    pub execution_notes: Option<String>,
    /// Passed timestamp
    pub passed_at: Option<Timestamp>,
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Row-level store for Sangha entities.
///
/// All operations are synchronous; implementations serialize access
/// internally. `with_transaction` is the only way to make a multi-row
/// mutation atomic - inside the closure, every access must go through the
/// `StoreTxn` view rather than back through the store.
pub trait DirectoryStore: Send + Sync {
    // === Member Operations ===

    /// Insert a new member.
    fn member_insert(&self, m: &Member) -> StoreResult<()>;

    /// Get a member by ID.
    fn member_get(&self, id: MemberId) -> StoreResult<Option<Member>>;

    /// Update a member.
    fn member_update(&self, id: MemberId, update: MemberUpdate) -> StoreResult<()>;

    // === Portfolio Operations ===

    /// Insert a portfolio template.
    fn portfolio_insert(&self, p: &Portfolio) -> StoreResult<()>;

    /// Get a portfolio by ID.
    fn portfolio_get(&self, id: PortfolioId) -> StoreResult<Option<Portfolio>>;

    // === Position Operations ===

    /// Insert a new leadership position.
    fn position_insert(&self, p: &LeadershipPosition) -> StoreResult<()>;

    /// Get a position by ID.
    fn position_get(&self, id: PositionId) -> StoreResult<Option<LeadershipPosition>>;

    /// List all positions held by a member.
    fn position_list_by_member(&self, member_id: MemberId)
        -> StoreResult<Vec<LeadershipPosition>>;

    /// Update a position.
    fn position_update(&self, id: PositionId, update: PositionUpdate) -> StoreResult<()>;

    /// Delete a position.
    fn position_delete(&self, id: PositionId) -> StoreResult<()>;

    // === Permission Operations ===

    /// Insert a grant row.
    fn permission_insert(&self, p: &PortfolioPermission) -> StoreResult<()>;

    /// Get the grant row for (portfolio, permission key).
    fn permission_get(
        &self,
        portfolio_id: PortfolioId,
        permission_key: &str,
    ) -> StoreResult<Option<PortfolioPermission>>;

    /// List all grant rows for a portfolio.
    fn permission_list_by_portfolio(
        &self,
        portfolio_id: PortfolioId,
    ) -> StoreResult<Vec<PortfolioPermission>>;

    // === Resolution Operations ===

    /// Insert a new resolution.
    fn resolution_insert(&self, r: &Resolution) -> StoreResult<()>;

    /// Get a resolution by ID.
    fn resolution_get(&self, id: ResolutionId) -> StoreResult<Option<Resolution>>;

    /// Update a resolution.
    fn resolution_update(&self, id: ResolutionId, update: ResolutionUpdate) -> StoreResult<()>;

    // === Appeal Operations ===

    /// Insert a new appeal.
    fn appeal_insert(&self, a: &Appeal) -> StoreResult<()>;

    /// List appeals filed against a resolution.
    fn appeal_list_by_resolution(&self, resolution_id: ResolutionId) -> StoreResult<Vec<Appeal>>;

    // === Election Operations ===

    /// Insert a new election.
    fn election_insert(&self, e: &Election) -> StoreResult<()>;

    /// List elections at an organizational level.
    fn election_list_by_level(&self, level: OrgLevel) -> StoreResult<Vec<Election>>;

    // === Commission Operations ===

    /// Insert a commission membership row.
    fn commission_insert(&self, c: &ElectionCommission) -> StoreResult<()>;

    /// List commission rows for an election.
    fn commission_list_by_election(
        &self,
        election_id: ElectionId,
    ) -> StoreResult<Vec<ElectionCommission>>;

    /// List commission rows for a member.
    fn commission_list_by_member(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Vec<ElectionCommission>>;

    /// Delete a commission membership row.
    fn commission_delete(&self, id: CommissionId) -> StoreResult<()>;

    // === Override Log Operations ===

    /// Insert an audit record. Audit rows are append-only.
    fn override_log_insert(&self, log: &AdminOverrideLog) -> StoreResult<()>;

    /// List audit records written for an admin user.
    fn override_log_list_by_admin(
        &self,
        admin_user_id: UserId,
    ) -> StoreResult<Vec<AdminOverrideLog>>;

    // === Transactions ===

    /// Run `f` atomically: every write made through the `StoreTxn` view
    /// commits if `f` returns `Ok` and is rolled back if it returns `Err`.
    /// Transactions serialize against each other and against single-row
    /// writes.
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTxn) -> Result<T, E>,
        E: From<StoreError>,
        Self: Sized;
}

// ============================================================================
// TRANSACTION VIEW
// ============================================================================

/// Mutable store view inside a transaction.
///
/// Reads observe earlier writes of the same transaction.
pub trait StoreTxn {
    fn member_get(&self, id: MemberId) -> StoreResult<Option<Member>>;
    fn member_update(&mut self, id: MemberId, update: MemberUpdate) -> StoreResult<()>;

    fn portfolio_get(&self, id: PortfolioId) -> StoreResult<Option<Portfolio>>;

    fn position_get(&self, id: PositionId) -> StoreResult<Option<LeadershipPosition>>;
    fn position_list_by_member(&self, member_id: MemberId)
        -> StoreResult<Vec<LeadershipPosition>>;
    fn position_update(&mut self, id: PositionId, update: PositionUpdate) -> StoreResult<()>;

    fn resolution_get(&self, id: ResolutionId) -> StoreResult<Option<Resolution>>;
    fn resolution_update(&mut self, id: ResolutionId, update: ResolutionUpdate)
        -> StoreResult<()>;

    fn appeal_list_by_resolution(&self, resolution_id: ResolutionId) -> StoreResult<Vec<Appeal>>;

    fn election_list_by_level(&self, level: OrgLevel) -> StoreResult<Vec<Election>>;

    fn commission_insert(&mut self, c: &ElectionCommission) -> StoreResult<()>;
    fn commission_list_by_election(
        &self,
        election_id: ElectionId,
    ) -> StoreResult<Vec<ElectionCommission>>;
    fn commission_list_by_member(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Vec<ElectionCommission>>;
    fn commission_delete(&mut self, id: CommissionId) -> StoreResult<()>;
}
