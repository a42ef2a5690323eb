//! Position lifecycle hooks and operations
//!
//! The position-mutating operations call explicit post-mutation hooks that
//! keep the ElectionCommission mirror in step: holders of EC-type portfolios
//! get one commission row per election at their level, and those rows are
//! removed when the position stops being current. Mirror failures are logged
//! and swallowed; they never block the position mutation that triggered them.

use chrono::Utc;
use sangha_core::{
    ElectionCommission, ElectionId, EntityId, EntityType, LeadershipPosition, MemberId, OrgLevel,
    Portfolio, PositionId, StoreError,
};
use sangha_store::{DirectoryStore, PositionUpdate, StoreResult};
use std::collections::HashSet;

// ============================================================================
// POSITION OPERATIONS
// ============================================================================

/// Assign a portfolio to a member: insert the position, then run the
/// creation hook. Returns the stored row, which the hook may have
/// auto-activated.
pub fn assign_position<S: DirectoryStore>(
    store: &S,
    member_id: MemberId,
    portfolio: &Portfolio,
    level: OrgLevel,
    entity_id: Option<EntityId>,
) -> StoreResult<LeadershipPosition> {
    if store.member_get(member_id)?.is_none() {
        return Err(StoreError::NotFound {
            entity_type: EntityType::Member,
            id: member_id,
        });
    }

    let mut position = LeadershipPosition::new(member_id, portfolio.portfolio_id, level);
    if let Some(entity_id) = entity_id {
        position = position.with_entity_id(entity_id);
    }
    store.position_insert(&position)?;
    position_created(store, &position)?;

    store
        .position_get(position.position_id)?
        .ok_or(StoreError::NotFound {
            entity_type: EntityType::Position,
            id: position.position_id,
        })
}

/// Soft-end a position: clear `is_current` and the active flag, stamp
/// `ended_at`, then run the update hook. Returns the ended row.
pub fn end_position<S: DirectoryStore>(
    store: &S,
    position_id: PositionId,
) -> StoreResult<LeadershipPosition> {
    let before = store
        .position_get(position_id)?
        .ok_or(StoreError::NotFound {
            entity_type: EntityType::Position,
            id: position_id,
        })?;

    store.position_update(
        position_id,
        PositionUpdate {
            is_current: Some(false),
            active_portfolio: Some(false),
            ended_at: Some(Utc::now()),
            ..Default::default()
        },
    )?;

    let after = store
        .position_get(position_id)?
        .ok_or(StoreError::NotFound {
            entity_type: EntityType::Position,
            id: position_id,
        })?;

    position_updated(store, &before, &after)?;
    Ok(after)
}

/// Hard-delete a position, then run the deletion hook.
pub fn remove_position<S: DirectoryStore>(
    store: &S,
    position_id: PositionId,
) -> StoreResult<()> {
    let position = store
        .position_get(position_id)?
        .ok_or(StoreError::NotFound {
            entity_type: EntityType::Position,
            id: position_id,
        })?;

    store.position_delete(position_id)?;
    position_deleted(store, &position)?;
    Ok(())
}

// ============================================================================
// LIFECYCLE HOOKS
// ============================================================================

/// Post-insert hook.
///
/// Auto-activates the position when the member has no other current active
/// one, and mirrors EC-type portfolios into commission membership. The
/// mirror step may fail without failing the hook.
pub fn position_created<S: DirectoryStore>(
    store: &S,
    position: &LeadershipPosition,
) -> StoreResult<()> {
    if position.is_current && !position.active_portfolio {
        let member_has_active = store
            .position_list_by_member(position.member_id)?
            .iter()
            .any(|p| p.position_id != position.position_id && p.is_current && p.active_portfolio);
        if !member_has_active {
            store.position_update(
                position.position_id,
                PositionUpdate {
                    active_portfolio: Some(true),
                    ..Default::default()
                },
            )?;
        }
    }

    if let Err(error) = mirror_commissions(store, position) {
        tracing::warn!(
            position_id = %position.position_id,
            %error,
            "election commission mirror failed after position create"
        );
    }
    Ok(())
}

/// Post-update hook.
///
/// Positions that stay current are re-mirrored (idempotent); positions that
/// transitioned out of `is_current` lose their mirrored commission rows at
/// the position's level.
pub fn position_updated<S: DirectoryStore>(
    store: &S,
    before: &LeadershipPosition,
    after: &LeadershipPosition,
) -> StoreResult<()> {
    if after.is_current {
        if let Err(error) = mirror_commissions(store, after) {
            tracing::warn!(
                position_id = %after.position_id,
                %error,
                "election commission mirror failed after position update"
            );
        }
    } else if before.is_current {
        if let Err(error) = remove_mirrored_commissions(store, after) {
            tracing::warn!(
                position_id = %after.position_id,
                %error,
                "election commission removal failed after position update"
            );
        }
    }
    Ok(())
}

/// Post-delete hook: same scoped commission removal as ending a position.
pub fn position_deleted<S: DirectoryStore>(
    store: &S,
    position: &LeadershipPosition,
) -> StoreResult<()> {
    if let Err(error) = remove_mirrored_commissions(store, position) {
        tracing::warn!(
            position_id = %position.position_id,
            %error,
            "election commission removal failed after position delete"
        );
    }
    Ok(())
}

// ============================================================================
// EC MIRRORING
// ============================================================================

/// One commission row per election at the position's level that does not
/// already list the member. Non-EC portfolios mirror nothing. The insert
/// loop runs in one transaction; a partial mirror never commits.
fn mirror_commissions<S: DirectoryStore>(
    store: &S,
    position: &LeadershipPosition,
) -> StoreResult<()> {
    let portfolio = store
        .portfolio_get(position.portfolio_id)?
        .ok_or(StoreError::NotFound {
            entity_type: EntityType::Portfolio,
            id: position.portfolio_id,
        })?;
    if !portfolio.portfolio_type.is_election_commission() {
        return Ok(());
    }

    let role = portfolio.commission_role();
    store.with_transaction(|txn| {
        for election in txn.election_list_by_level(position.level)? {
            let already_listed = txn
                .commission_list_by_election(election.election_id)?
                .iter()
                .any(|c| c.member_id == position.member_id);
            if already_listed {
                continue;
            }
            txn.commission_insert(&ElectionCommission::new(
                election.election_id,
                position.member_id,
                role,
            ))?;
        }
        Ok(())
    })
}

/// Remove the member's commission rows for elections at the position's
/// level, atomically. Rows tied to elections at other levels stay.
fn remove_mirrored_commissions<S: DirectoryStore>(
    store: &S,
    position: &LeadershipPosition,
) -> StoreResult<()> {
    store.with_transaction(|txn| {
        let level_elections: HashSet<ElectionId> = txn
            .election_list_by_level(position.level)?
            .into_iter()
            .map(|e| e.election_id)
            .collect();

        for commission in txn.commission_list_by_member(position.member_id)? {
            if level_elections.contains(&commission.election_id) {
                txn.commission_delete(commission.commission_id)?;
            }
        }
        Ok(())
    })
}

// =============================================================================
// TESTS
// =============================================================================
