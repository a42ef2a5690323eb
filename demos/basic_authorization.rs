//! Basic Authorization Example
//!
//! Demonstrates the fundamental Sangha authorization workflow:
//! 1. Seed members, portfolios, and permission grants
//! 2. Assign leadership positions (the first one auto-activates)
//! 3. Check a permission through the active portfolio
//! 4. Switch the active portfolio and watch the grants change
//! 5. Fall back to an audited admin override
//! 6. Execute an action under the authority of a passed resolution
//!
//! This example uses the in-memory store for simplicity.

use sangha_authz::{
    assign_position, AuthorizationGate, AuthzError, AuthzRequest, PortfolioAuthorizationService,
};
use sangha_core::{
    ActionGrants, AuthenticatedUser, AuthzConfig, AuthzTarget, Member, MemberStatus, OrgLevel,
    PermissionAction, Portfolio, PortfolioPermission, PortfolioType, Resolution,
    ResolutionStatus, Role, SanghaResult,
};
use sangha_mandate::{execute_with_resolution, ExecutionRequirements};
use sangha_store::{DirectoryStore, MemberUpdate, MemoryStore};
use serde_json::json;

fn main() -> SanghaResult<()> {
    println!("=== Sangha Basic Authorization Example ===\n");

    // Step 1: Configuration
    let config = AuthzConfig::default();
    config.validate()?;
    println!("✓ Configuration validated");
    println!("  Super-admin role: {}", config.super_admin_role);

    // Step 2: Initialize the store and seed the directory
    let store = MemoryStore::new();
    let (officer, target, district_portfolio, state_portfolio) = seed_directory(&store)?;
    println!("\n✓ Directory seeded");
    println!("  Officer: {} ({})", officer.full_name, officer.membership_no);
    println!("  Target member: {} ({})", target.full_name, target.membership_no);

    // Step 3: Assign positions; the first assignment auto-activates
    let district_position = assign_position(
        &store,
        officer.member_id,
        &district_portfolio,
        OrgLevel::District,
        None,
    )?;
    let state_position = assign_position(
        &store,
        officer.member_id,
        &state_portfolio,
        OrgLevel::State,
        None,
    )?;
    println!("\n✓ Positions assigned");
    println!(
        "  {} -> active: {}",
        district_portfolio.name, district_position.active_portfolio
    );
    println!(
        "  {} -> active: {}",
        state_portfolio.name, state_position.active_portfolio
    );

    // Step 4: Authorize through the active portfolio
    let gate = AuthorizationGate::new(
        PortfolioAuthorizationService::new(store.clone()),
        config.clone(),
    );
    let user = AuthenticatedUser::new(
        sangha_core::new_entity_id(),
        Role::parse("member", &config.super_admin_role),
    )
    .with_member_id(officer.member_id);

    let request = AuthzRequest::new("member.approve", PermissionAction::Execute);
    let grant = gate.authorize(&user, &request)?;
    println!("\n✓ Permission granted through the active portfolio");
    println!("  Grant: {:?}", grant);

    let routes = gate.service().user_routes(&user)?;
    println!("  Routes reachable: {}", routes.len());
    for route in &routes {
        println!("    - {}", route);
    }

    // Step 5: Switch to the state position; the district grant no longer applies
    let switched = gate
        .service()
        .switch_active_portfolio(&user, state_position.position_id)?;
    println!("\n✓ Active portfolio switched: {}", switched);
    match gate.authorize(&user, &request) {
        Err(AuthzError::Denied { permission_key, .. }) => {
            println!("  '{}' now denied, as expected", permission_key);
        }
        other => println!("  Unexpected outcome: {:?}", other),
    }
    gate.service()
        .switch_active_portfolio(&user, district_position.position_id)?;

    // Step 6: Admin override with an audit trail
    let admin = AuthenticatedUser::new(
        sangha_core::new_entity_id(),
        Role::parse("district_admin", &config.super_admin_role),
    );
    let override_request = AuthzRequest::new("member.suspend", PermissionAction::Execute)
        .with_level(OrgLevel::District)
        .with_target(
            AuthzTarget::new("member")
                .with_target_id(target.member_id)
                .with_title(target.full_name.clone()),
        )
        .with_justification("Suspension pending inquiry 14/2026");
    let grant = gate.authorize(&admin, &override_request)?;
    let audit_rows = store.override_log_list_by_admin(admin.user_id)?;
    println!("\n✓ Admin override granted: {:?}", grant);
    println!("  Audit rows written: {}", audit_rows.len());
    println!("  Justification: {}", audit_rows[0].justification);

    // Step 7: Execute an action under a passed resolution
    let resolution = create_suspension_resolution(&store, &target)?;
    println!("\n✓ Resolution recorded");
    println!("  Title: {}", resolution.title);
    println!("  Status: {}", resolution.status);

    let requirements = ExecutionRequirements::new("disciplinary", "member_suspension")
        .expect_target("member_id", json!(target.member_id));
    let executed = execute_with_resolution(
        &store,
        &user,
        resolution.resolution_id,
        &requirements,
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
    )?;
    println!("\n✓ Resolution executed");
    println!("  Status: {}", executed.status);
    println!("  Notes: {}", executed.execution_notes.as_deref().unwrap_or("-"));

    let suspended = store
        .member_get(target.member_id)?
        .expect("target member exists");
    println!("  {} is now {}", suspended.full_name, suspended.status);

    // Step 8: A second execution attempt fails the eligibility checks
    let second = execute_with_resolution(
        &store,
        &user,
        resolution.resolution_id,
        &requirements,
        |_| Ok(()),
        None,
    );
    match second {
        Err(err) => println!("\n✓ Re-execution rejected: {}", err),
        Ok(_) => println!("\n  Unexpected: resolution executed twice"),
    }

    println!("\n=== Example complete ===");
    Ok(())
}

/// Seed two members, two executive portfolios, and the district grant table.
fn seed_directory(
    store: &MemoryStore,
) -> SanghaResult<(Member, Member, Portfolio, Portfolio)> {
    let officer = Member::new("Asha Verma", "MH-2201");
    let target = Member::new("Ravi Kulkarni", "MH-2202");
    store.member_insert(&officer)?;
    store.member_insert(&target)?;

    let district = Portfolio::new(
        "DIST_PRESIDENT",
        "District President",
        PortfolioType::Executive,
        OrgLevel::District,
    );
    let state = Portfolio::new(
        "STATE_SECRETARY",
        "State Secretary",
        PortfolioType::Executive,
        OrgLevel::State,
    );
    store.portfolio_insert(&district)?;
    store.portfolio_insert(&state)?;

    store.permission_insert(&PortfolioPermission::new(
        district.portfolio_id,
        "member.approve",
        "member",
        ActionGrants::READ | ActionGrants::EXECUTE,
    ))?;
    store.permission_insert(&PortfolioPermission::new(
        district.portfolio_id,
        "member.view",
        "member",
        ActionGrants::READ,
    ))?;

    Ok((officer, target, district, state))
}

/// Record a passed disciplinary resolution that proposes suspending `target`.
fn create_suspension_resolution(
    store: &MemoryStore,
    target: &Member,
) -> SanghaResult<Resolution> {
    let resolution = Resolution::new(
        format!("Suspend {} pending inquiry", target.full_name),
        "disciplinary",
        "member_suspension",
    )
    .with_status(ResolutionStatus::Passed)
    .with_proposed_action(json!({ "member_id": target.member_id }));
    store.resolution_insert(&resolution)?;
    Ok(resolution)
}
