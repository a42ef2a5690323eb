//! In-memory store implementation
//!
//! A single `RwLock` guards the whole table set. Transactions take the write
//! lock for their full duration, which serializes them against each other and
//! against single-row writes; rollback restores a pre-closure snapshot of the
//! tables.

use crate::{
    DirectoryStore, MemberUpdate, PositionUpdate, ResolutionUpdate, StoreResult, StoreTxn,
};
use sangha_core::{
    AdminOverrideLog, Appeal, Election, ElectionCommission, EntityType, LeadershipPosition,
    Member, OrgLevel, Portfolio, PortfolioPermission, Resolution, StoreError,
};
use sangha_core::{
    CommissionId, ElectionId, MemberId, PortfolioId, PositionId, ResolutionId, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

// ============================================================================
// TABLES
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Tables {
    members: HashMap<Uuid, Member>,
    portfolios: HashMap<Uuid, Portfolio>,
    positions: HashMap<Uuid, LeadershipPosition>,
    permissions: HashMap<(Uuid, String), PortfolioPermission>,
    resolutions: HashMap<Uuid, Resolution>,
    appeals: HashMap<Uuid, Appeal>,
    elections: HashMap<Uuid, Election>,
    commissions: HashMap<Uuid, ElectionCommission>,
    override_logs: HashMap<Uuid, AdminOverrideLog>,
}

impl Tables {
    fn member_insert(&mut self, m: &Member) -> StoreResult<()> {
        if self.members.contains_key(&m.member_id) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::Member,
                reason: "already exists".to_string(),
            });
        }
        self.members.insert(m.member_id, m.clone());
        Ok(())
    }

    fn member_get(&self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(self.members.get(&id).cloned())
    }

    fn member_update(&mut self, id: MemberId, update: MemberUpdate) -> StoreResult<()> {
        let member = self.members.get_mut(&id).ok_or(StoreError::NotFound {
            entity_type: EntityType::Member,
            id,
        })?;

        if let Some(status) = update.status {
            member.status = status;
        }
        if let Some(tehsil_id) = update.tehsil_id {
            member.tehsil_id = Some(tehsil_id);
        }

        Ok(())
    }

    fn portfolio_insert(&mut self, p: &Portfolio) -> StoreResult<()> {
        if self.portfolios.contains_key(&p.portfolio_id) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::Portfolio,
                reason: "already exists".to_string(),
            });
        }
        self.portfolios.insert(p.portfolio_id, p.clone());
        Ok(())
    }

    fn portfolio_get(&self, id: PortfolioId) -> StoreResult<Option<Portfolio>> {
        Ok(self.portfolios.get(&id).cloned())
    }

    fn position_insert(&mut self, p: &LeadershipPosition) -> StoreResult<()> {
        if self.positions.contains_key(&p.position_id) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::Position,
                reason: "already exists".to_string(),
            });
        }
        self.positions.insert(p.position_id, p.clone());
        Ok(())
    }

    fn position_get(&self, id: PositionId) -> StoreResult<Option<LeadershipPosition>> {
        Ok(self.positions.get(&id).cloned())
    }

    fn position_list_by_member(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Vec<LeadershipPosition>> {
        Ok(self
            .positions
            .values()
            .filter(|p| p.member_id == member_id)
            .cloned()
            .collect())
    }

    fn position_update(&mut self, id: PositionId, update: PositionUpdate) -> StoreResult<()> {
        let position = self.positions.get_mut(&id).ok_or(StoreError::NotFound {
            entity_type: EntityType::Position,
            id,
        })?;

        if let Some(is_current) = update.is_current {
            position.is_current = is_current;
        }
        if let Some(active_portfolio) = update.active_portfolio {
            position.active_portfolio = active_portfolio;
        }
        if let Some(ended_at) = update.ended_at {
            position.ended_at = Some(ended_at);
        }
        if let Some(action_count) = update.action_count {
            position.action_count = action_count;
        }
        if let Some(last_accessed_at) = update.last_accessed_at {
            position.last_accessed_at = Some(last_accessed_at);
        }

        Ok(())
    }

    fn position_delete(&mut self, id: PositionId) -> StoreResult<()> {
        self.positions.remove(&id).ok_or(StoreError::NotFound {
            entity_type: EntityType::Position,
            id,
        })?;
        Ok(())
    }

    fn permission_insert(&mut self, p: &PortfolioPermission) -> StoreResult<()> {
        let key = (p.portfolio_id, p.permission_key.clone());
        if self.permissions.contains_key(&key) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::Permission,
                reason: format!("grant for '{}' already exists", p.permission_key),
            });
        }
        self.permissions.insert(key, p.clone());
        Ok(())
    }

    fn permission_get(
        &self,
        portfolio_id: PortfolioId,
        permission_key: &str,
    ) -> StoreResult<Option<PortfolioPermission>> {
        Ok(self
            .permissions
            .get(&(portfolio_id, permission_key.to_string()))
            .cloned())
    }

    fn permission_list_by_portfolio(
        &self,
        portfolio_id: PortfolioId,
    ) -> StoreResult<Vec<PortfolioPermission>> {
        Ok(self
            .permissions
            .values()
            .filter(|p| p.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }

    fn resolution_insert(&mut self, r: &Resolution) -> StoreResult<()> {
        if self.resolutions.contains_key(&r.resolution_id) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::Resolution,
                reason: "already exists".to_string(),
            });
        }
        self.resolutions.insert(r.resolution_id, r.clone());
        Ok(())
    }

    fn resolution_get(&self, id: ResolutionId) -> StoreResult<Option<Resolution>> {
        Ok(self.resolutions.get(&id).cloned())
    }

    fn resolution_update(&mut self, id: ResolutionId, update: ResolutionUpdate) -> StoreResult<()> {
        let resolution = self.resolutions.get_mut(&id).ok_or(StoreError::NotFound {
            entity_type: EntityType::Resolution,
            id,
        })?;

        if let Some(status) = update.status {
            resolution.status = status;
        }
        if let Some(proposed_action) = update.proposed_action {
            resolution.proposed_action = Some(proposed_action);
        }
        if let Some(executed_by) = update.executed_by {
            resolution.executed_by = Some(executed_by);
        }
        if let Some(executed_at) = update.executed_at {
            resolution.executed_at = Some(executed_at);
        }
        if let Some(execution_notes) = update.execution_notes {
            resolution.execution_notes = Some(execution_notes);
        }
        if let Some(passed_at) = update.passed_at {
            resolution.passed_at = Some(passed_at);
        }

        Ok(())
    }

    fn appeal_insert(&mut self, a: &Appeal) -> StoreResult<()> {
        if self.appeals.contains_key(&a.appeal_id) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::Appeal,
                reason: "already exists".to_string(),
            });
        }
        self.appeals.insert(a.appeal_id, a.clone());
        Ok(())
    }

    fn appeal_list_by_resolution(&self, resolution_id: ResolutionId) -> StoreResult<Vec<Appeal>> {
        Ok(self
            .appeals
            .values()
            .filter(|a| a.resolution_id == resolution_id)
            .cloned()
            .collect())
    }

    fn election_insert(&mut self, e: &Election) -> StoreResult<()> {
        if self.elections.contains_key(&e.election_id) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::Election,
                reason: "already exists".to_string(),
            });
        }
        self.elections.insert(e.election_id, e.clone());
        Ok(())
    }

    fn election_list_by_level(&self, level: OrgLevel) -> StoreResult<Vec<Election>> {
        Ok(self
            .elections
            .values()
            .filter(|e| e.level == level)
            .cloned()
            .collect())
    }

    fn commission_insert(&mut self, c: &ElectionCommission) -> StoreResult<()> {
        if self.commissions.contains_key(&c.commission_id) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::Commission,
                reason: "already exists".to_string(),
            });
        }
        self.commissions.insert(c.commission_id, c.clone());
        Ok(())
    }

    fn commission_list_by_election(
        &self,
        election_id: ElectionId,
    ) -> StoreResult<Vec<ElectionCommission>> {
        Ok(self
            .commissions
            .values()
            .filter(|c| c.election_id == election_id)
            .cloned()
            .collect())
    }

    fn commission_list_by_member(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Vec<ElectionCommission>> {
        Ok(self
            .commissions
            .values()
            .filter(|c| c.member_id == member_id)
            .cloned()
            .collect())
    }

    fn commission_delete(&mut self, id: CommissionId) -> StoreResult<()> {
        self.commissions.remove(&id).ok_or(StoreError::NotFound {
            entity_type: EntityType::Commission,
            id,
        })?;
        Ok(())
    }

    fn override_log_insert(&mut self, log: &AdminOverrideLog) -> StoreResult<()> {
        if self.override_logs.contains_key(&log.log_id) {
            return Err(StoreError::Conflict {
                entity_type: EntityType::OverrideLog,
                reason: "already exists".to_string(),
            });
        }
        self.override_logs.insert(log.log_id, log.clone());
        Ok(())
    }

    fn override_log_list_by_admin(
        &self,
        admin_user_id: UserId,
    ) -> StoreResult<Vec<AdminOverrideLog>> {
        Ok(self
            .override_logs
            .values()
            .filter(|l| l.admin_user_id == admin_user_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory store backed by a single `RwLock` over the table set.
///
/// Cloning is cheap; clones share the same underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) -> StoreResult<()> {
        let mut tables = self.write()?;
        *tables = Tables::default();
        Ok(())
    }

    /// Get count of stored members.
    pub fn member_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.members.len())
    }

    /// Get count of stored positions.
    pub fn position_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.positions.len())
    }

    /// Get count of stored resolutions.
    pub fn resolution_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.resolutions.len())
    }

    /// Get count of stored commission rows.
    pub fn commission_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.commissions.len())
    }

    /// Get count of stored audit records.
    pub fn override_log_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.override_logs.len())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl DirectoryStore for MemoryStore {
    // === Member Operations ===

    fn member_insert(&self, m: &Member) -> StoreResult<()> {
        self.write()?.member_insert(m)
    }

    fn member_get(&self, id: MemberId) -> StoreResult<Option<Member>> {
        self.read()?.member_get(id)
    }

    fn member_update(&self, id: MemberId, update: MemberUpdate) -> StoreResult<()> {
        self.write()?.member_update(id, update)
    }

    // === Portfolio Operations ===

    fn portfolio_insert(&self, p: &Portfolio) -> StoreResult<()> {
        self.write()?.portfolio_insert(p)
    }

    fn portfolio_get(&self, id: PortfolioId) -> StoreResult<Option<Portfolio>> {
        self.read()?.portfolio_get(id)
    }

    // === Position Operations ===

    fn position_insert(&self, p: &LeadershipPosition) -> StoreResult<()> {
        self.write()?.position_insert(p)
    }

    fn position_get(&self, id: PositionId) -> StoreResult<Option<LeadershipPosition>> {
        self.read()?.position_get(id)
    }

    fn position_list_by_member(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Vec<LeadershipPosition>> {
        self.read()?.position_list_by_member(member_id)
    }

    fn position_update(&self, id: PositionId, update: PositionUpdate) -> StoreResult<()> {
        self.write()?.position_update(id, update)
    }

    fn position_delete(&self, id: PositionId) -> StoreResult<()> {
        self.write()?.position_delete(id)
    }

    // === Permission Operations ===

    fn permission_insert(&self, p: &PortfolioPermission) -> StoreResult<()> {
        self.write()?.permission_insert(p)
    }

    fn permission_get(
        &self,
        portfolio_id: PortfolioId,
        permission_key: &str,
    ) -> StoreResult<Option<PortfolioPermission>> {
        self.read()?.permission_get(portfolio_id, permission_key)
    }

    fn permission_list_by_portfolio(
        &self,
        portfolio_id: PortfolioId,
    ) -> StoreResult<Vec<PortfolioPermission>> {
        self.read()?.permission_list_by_portfolio(portfolio_id)
    }

    // === Resolution Operations ===

    fn resolution_insert(&self, r: &Resolution) -> StoreResult<()> {
        self.write()?.resolution_insert(r)
    }

    fn resolution_get(&self, id: ResolutionId) -> StoreResult<Option<Resolution>> {
        self.read()?.resolution_get(id)
    }

    fn resolution_update(&self, id: ResolutionId, update: ResolutionUpdate) -> StoreResult<()> {
        self.write()?.resolution_update(id, update)
    }

    // === Appeal Operations ===

    fn appeal_insert(&self, a: &Appeal) -> StoreResult<()> {
        self.write()?.appeal_insert(a)
    }

    fn appeal_list_by_resolution(&self, resolution_id: ResolutionId) -> StoreResult<Vec<Appeal>> {
        self.read()?.appeal_list_by_resolution(resolution_id)
    }

    // === Election Operations ===

    fn election_insert(&self, e: &Election) -> StoreResult<()> {
        self.write()?.election_insert(e)
    }

    fn election_list_by_level(&self, level: OrgLevel) -> StoreResult<Vec<Election>> {
        self.read()?.election_list_by_level(level)
    }

    // === Commission Operations ===

    fn commission_insert(&self, c: &ElectionCommission) -> StoreResult<()> {
        self.write()?.commission_insert(c)
    }

    fn commission_list_by_election(
        &self,
        election_id: ElectionId,
    ) -> StoreResult<Vec<ElectionCommission>> {
        self.read()?.commission_list_by_election(election_id)
    }

    fn commission_list_by_member(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Vec<ElectionCommission>> {
        self.read()?.commission_list_by_member(member_id)
    }

    fn commission_delete(&self, id: CommissionId) -> StoreResult<()> {
        self.write()?.commission_delete(id)
    }

    // === Override Log Operations ===

    fn override_log_insert(&self, log: &AdminOverrideLog) -> StoreResult<()> {
        self.write()?.override_log_insert(log)
    }

    fn override_log_list_by_admin(
        &self,
        admin_user_id: UserId,
    ) -> StoreResult<Vec<AdminOverrideLog>> {
        self.read()?.override_log_list_by_admin(admin_user_id)
    }

    // === Transactions ===

    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTxn) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| E::from(StoreError::LockPoisoned))?;
        let snapshot = tables.clone();
        let mut txn = MemoryTxn {
            tables: &mut tables,
        };
        match f(&mut txn) {
            Ok(value) => Ok(value),
            Err(err) => {
                *tables = snapshot;
                Err(err)
            }
        }
    }
}

// ============================================================================
// TRANSACTION VIEW
// ============================================================================

struct MemoryTxn<'a> {
    tables: &'a mut Tables,
}

impl StoreTxn for MemoryTxn<'_> {
    fn member_get(&self, id: MemberId) -> StoreResult<Option<Member>> {
        self.tables.member_get(id)
    }

    fn member_update(&mut self, id: MemberId, update: MemberUpdate) -> StoreResult<()> {
        self.tables.member_update(id, update)
    }

    fn portfolio_get(&self, id: PortfolioId) -> StoreResult<Option<Portfolio>> {
        self.tables.portfolio_get(id)
    }

    fn position_get(&self, id: PositionId) -> StoreResult<Option<LeadershipPosition>> {
        self.tables.position_get(id)
    }

    fn position_list_by_member(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Vec<LeadershipPosition>> {
        self.tables.position_list_by_member(member_id)
    }

    fn position_update(&mut self, id: PositionId, update: PositionUpdate) -> StoreResult<()> {
        self.tables.position_update(id, update)
    }

    fn resolution_get(&self, id: ResolutionId) -> StoreResult<Option<Resolution>> {
        self.tables.resolution_get(id)
    }

    fn resolution_update(
        &mut self,
        id: ResolutionId,
        update: ResolutionUpdate,
    ) -> StoreResult<()> {
        self.tables.resolution_update(id, update)
    }

    fn appeal_list_by_resolution(&self, resolution_id: ResolutionId) -> StoreResult<Vec<Appeal>> {
        self.tables.appeal_list_by_resolution(resolution_id)
    }

    fn election_list_by_level(&self, level: OrgLevel) -> StoreResult<Vec<Election>> {
        self.tables.election_list_by_level(level)
    }

    fn commission_insert(&mut self, c: &ElectionCommission) -> StoreResult<()> {
        self.tables.commission_insert(c)
    }

    fn commission_list_by_election(
        &self,
        election_id: ElectionId,
    ) -> StoreResult<Vec<ElectionCommission>> {
        self.tables.commission_list_by_election(election_id)
    }

    fn commission_list_by_member(
        &self,
        member_id: MemberId,
    ) -> StoreResult<Vec<ElectionCommission>> {
        self.tables.commission_list_by_member(member_id)
    }

    fn commission_delete(&mut self, id: CommissionId) -> StoreResult<()> {
        self.tables.commission_delete(id)
    }
}

// =============================================================================
// TESTS
// =============================================================================
