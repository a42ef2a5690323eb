//! Resolution-gated execution
//!
//! Runs an action under the authority of a passed resolution and stamps the
//! resolution executed, atomically. The eligibility checks re-run inside the
//! transaction against freshly-read rows, so of two concurrent execution
//! attempts exactly one can commit; the loser fails its re-validation.

use crate::eligibility::{validate_for_execution, ExecutionRequirements};
use chrono::Utc;
use sangha_core::{
    AuthenticatedUser, LeadershipPosition, MandateError, MemberId, Resolution, ResolutionId,
    ResolutionStatus,
};
use sangha_store::{DirectoryStore, ResolutionUpdate, StoreResult, StoreTxn};

/// Execute `action` under the authority of a resolution.
///
/// The caller must hold a current leadership position; the active one is
/// preferred, else the earliest by start date. Inside one transaction the
/// resolution is reloaded, re-validated against `requirements` and its
/// appeals, the action runs, and the execution stamp is written. An error
/// anywhere rolls the whole transaction back, leaving no partial execution
/// markers.
pub fn execute_with_resolution<S, F>(
    store: &S,
    user: &AuthenticatedUser,
    resolution_id: ResolutionId,
    requirements: &ExecutionRequirements,
    action: F,
    notes: Option<String>,
) -> Result<Resolution, MandateError>
where
    S: DirectoryStore,
    F: FnOnce(&mut dyn StoreTxn) -> Result<(), MandateError>,
{
    let member_id = user.member_id.ok_or(MandateError::NoActivePosition)?;
    let position = current_position(store, member_id)?.ok_or(MandateError::NoActivePosition)?;

    let portfolio_name = store
        .portfolio_get(position.portfolio_id)?
        .map(|p| p.name)
        .unwrap_or_else(|| "unknown portfolio".to_string());

    store.with_transaction(|txn| {
        let resolution = txn
            .resolution_get(resolution_id)?
            .ok_or(MandateError::ResolutionNotFound { id: resolution_id })?;
        let appeals = txn.appeal_list_by_resolution(resolution_id)?;
        validate_for_execution(&resolution, &appeals, requirements)?;

        action(txn)?;

        let notes =
            notes.unwrap_or_else(|| format!("Executed through portfolio '{portfolio_name}'"));
        txn.resolution_update(
            resolution_id,
            ResolutionUpdate {
                status: Some(ResolutionStatus::Executed),
                executed_by: Some(position.position_id),
                executed_at: Some(Utc::now()),
                execution_notes: Some(notes),
                ..Default::default()
            },
        )?;

        txn.resolution_get(resolution_id)?
            .ok_or(MandateError::ResolutionNotFound { id: resolution_id })
    })
}

/// The caller's current position: the active one when present, else the
/// earliest current one by start date.
fn current_position<S: DirectoryStore>(
    store: &S,
    member_id: MemberId,
) -> StoreResult<Option<LeadershipPosition>> {
    let mut current: Vec<LeadershipPosition> = store
        .position_list_by_member(member_id)?
        .into_iter()
        .filter(|p| p.is_current)
        .collect();
    current.sort_by_key(|p| (p.started_at, p.position_id));

    if let Some(active) = current.iter().find(|p| p.active_portfolio) {
        return Ok(Some(active.clone()));
    }
    Ok(current.into_iter().next())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sangha_store::MemberUpdate;
    use sangha_test_utils::assertions::assert_no_active_position;
    use sangha_test_utils::{fixtures, MemberStatus, MemoryStore};
    use serde_json::json;

    fn suspension_requirements() -> ExecutionRequirements {
        ExecutionRequirements::new("disciplinary", "member_suspension")
            .expect_target("member_id", json!(42))
    }

    /// Store with an executing officer (active district position) and a
    /// passed suspension resolution.
    fn seeded() -> (MemoryStore, AuthenticatedUser, Resolution) {
        let store = MemoryStore::new();
        let officer = fixtures::member();
        let portfolio = fixtures::executive_portfolio(sangha_core::OrgLevel::District);
        let position = fixtures::active_position(&officer, &portfolio);
        let resolution = fixtures::passed_resolution();
        store.member_insert(&officer).unwrap();
        store.portfolio_insert(&portfolio).unwrap();
        store.position_insert(&position).unwrap();
        store.resolution_insert(&resolution).unwrap();
        let user = fixtures::user_for(&officer, "member");
        (store, user, resolution)
    }

    #[test]
    fn test_execute_runs_action_and_stamps() {
        let (store, user, resolution) = seeded();
        let target = fixtures::member();
        store.member_insert(&target).unwrap();

        let executed = execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &suspension_requirements(),
            |txn| {
                txn.member_update(
                    target.member_id,
                    MemberUpdate {
                        status: Some(MemberStatus::Suspended),
                        ..Default::default()
                    },
                )?;
                Ok(())
            },
            None,
        )
        .unwrap();

        assert_eq!(executed.status, ResolutionStatus::Executed);
        assert!(executed.executed_at.is_some());
        assert!(executed.executed_by.is_some());
        let notes = executed.execution_notes.unwrap();
        assert!(notes.contains("District President"), "default note names the portfolio: {notes}");

        let suspended = store.member_get(target.member_id).unwrap().unwrap();
        assert_eq!(suspended.status, MemberStatus::Suspended);
    }

    #[test]
    fn test_execute_keeps_custom_notes() {
        let (store, user, resolution) = seeded();
        let executed = execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &suspension_requirements(),
            |_| Ok(()),
            Some("Resolution 17/2026 carried out".to_string()),
        )
        .unwrap();
        assert_eq!(
            executed.execution_notes.as_deref(),
            Some("Resolution 17/2026 carried out")
        );
    }

    #[test]
    fn test_execute_requires_member_link() {
        let (store, _, resolution) = seeded();
        let stranger = fixtures::district_admin();
        let result = execute_with_resolution(
            &store,
            &stranger,
            resolution.resolution_id,
            &suspension_requirements(),
            |_| Ok(()),
            None,
        );
        assert_no_active_position(&result);
    }

    #[test]
    fn test_execute_requires_current_position() {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let resolution = fixtures::passed_resolution();
        store.member_insert(&member).unwrap();
        store.resolution_insert(&resolution).unwrap();
        let user = fixtures::user_for(&member, "member");

        let result = execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &suspension_requirements(),
            |_| Ok(()),
            None,
        );
        assert_no_active_position(&result);
    }

    #[test]
    fn test_execute_prefers_active_position() {
        let (store, user, resolution) = seeded();
        let member_id = user.member_id.unwrap();
        // An older dormant position; the newer active one must still win.
        let tehsil = fixtures::executive_portfolio(sangha_core::OrgLevel::Tehsil);
        store.portfolio_insert(&tehsil).unwrap();
        let mut dormant = sangha_core::LeadershipPosition::new(
            member_id,
            tehsil.portfolio_id,
            sangha_core::OrgLevel::Tehsil,
        );
        dormant.started_at = Utc::now() - chrono::Duration::days(365);
        store.position_insert(&dormant).unwrap();

        let executed = execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &suspension_requirements(),
            |_| Ok(()),
            None,
        )
        .unwrap();

        let active = store
            .position_list_by_member(member_id)
            .unwrap()
            .into_iter()
            .find(|p| p.active_portfolio)
            .unwrap();
        assert_eq!(executed.executed_by, Some(active.position_id));
    }

    #[test]
    fn test_execute_falls_back_to_earliest_current() {
        let store = MemoryStore::new();
        let member = fixtures::member();
        let portfolio = fixtures::executive_portfolio(sangha_core::OrgLevel::District);
        let resolution = fixtures::passed_resolution();
        store.member_insert(&member).unwrap();
        store.portfolio_insert(&portfolio).unwrap();
        store.resolution_insert(&resolution).unwrap();

        let mut older = fixtures::dormant_position(&member, &portfolio);
        older.started_at = Utc::now() - chrono::Duration::days(100);
        let newer = fixtures::dormant_position(&member, &portfolio);
        store.position_insert(&older).unwrap();
        store.position_insert(&newer).unwrap();
        let user = fixtures::user_for(&member, "member");

        let executed = execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &suspension_requirements(),
            |_| Ok(()),
            None,
        )
        .unwrap();
        assert_eq!(executed.executed_by, Some(older.position_id));
    }

    #[test]
    fn test_execute_missing_resolution() {
        let (store, user, _) = seeded();
        let result = execute_with_resolution(
            &store,
            &user,
            sangha_core::new_entity_id(),
            &suspension_requirements(),
            |_| Ok(()),
            None,
        );
        assert!(matches!(
            result,
            Err(MandateError::ResolutionNotFound { .. })
        ));
    }

    #[test]
    fn test_frozen_resolution_does_not_execute() {
        let (store, user, resolution) = seeded();
        store
            .appeal_insert(&fixtures::freezing_appeal(resolution.resolution_id))
            .unwrap();

        let result = execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &suspension_requirements(),
            |_| Ok(()),
            None,
        );
        assert!(matches!(result, Err(MandateError::NotEligible(_))));

        let untouched = store
            .resolution_get(resolution.resolution_id)
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, ResolutionStatus::Passed);
        assert!(untouched.executed_at.is_none());
    }

    #[test]
    fn test_action_failure_rolls_back_everything() {
        let (store, user, resolution) = seeded();
        let target = fixtures::member();
        store.member_insert(&target).unwrap();

        let result = execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &suspension_requirements(),
            |txn| {
                // A write that must not survive the failure below.
                txn.member_update(
                    target.member_id,
                    MemberUpdate {
                        status: Some(MemberStatus::Suspended),
                        ..Default::default()
                    },
                )?;
                Err(MandateError::ActionFailed {
                    reason: "ledger unavailable".to_string(),
                })
            },
            None,
        );
        assert!(matches!(result, Err(MandateError::ActionFailed { .. })));

        let member = store.member_get(target.member_id).unwrap().unwrap();
        assert_eq!(member.status, MemberStatus::Active, "action write rolled back");
        let untouched = store
            .resolution_get(resolution.resolution_id)
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, ResolutionStatus::Passed);
        assert!(untouched.executed_at.is_none());
        assert!(untouched.executed_by.is_none());
    }

    #[test]
    fn test_second_execution_fails() {
        let (store, user, resolution) = seeded();
        let requirements = suspension_requirements();

        execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &requirements,
            |_| Ok(()),
            None,
        )
        .unwrap();

        let result = execute_with_resolution(
            &store,
            &user,
            resolution.resolution_id,
            &requirements,
            |_| Ok(()),
            None,
        );
        assert!(matches!(result, Err(MandateError::NotEligible(_))));
    }

    #[test]
    fn test_concurrent_executions_exactly_one_succeeds() {
        let (store, user, resolution) = seeded();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let user = user.clone();
            let resolution_id = resolution.resolution_id;
            handles.push(std::thread::spawn(move || {
                execute_with_resolution(
                    &store,
                    &user,
                    resolution_id,
                    &suspension_requirements(),
                    |_| Ok(()),
                    None,
                )
                .is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1, "exactly one concurrent execution wins");
    }
}
