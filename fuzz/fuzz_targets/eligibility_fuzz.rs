//! Fuzz test for resolution eligibility validation
//!
//! Proposed-action payloads are caller-supplied JSON. This fuzz target runs
//! arbitrary JSON documents through the eligibility checks to find:
//! - Panics or crashes
//! - Violations of the target-validation self-match invariant
//!
//! Run with: cargo +nightly fuzz run eligibility_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use sangha_core::{Resolution, ResolutionStatus};
use sangha_mandate::{validate_for_execution, ExecutionRequirements};

fuzz_target!(|data: &[u8]| {
    let Ok(action) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let resolution = Resolution::new("Fuzzed resolution", "disciplinary", "member_suspension")
        .with_status(ResolutionStatus::Passed)
        .with_proposed_action(action.clone());

    // Validation must never panic, whatever shape the action takes.
    let unconstrained = validate_for_execution(
        &resolution,
        &[],
        &ExecutionRequirements::new("disciplinary", "member_suspension"),
    );

    if let serde_json::Value::Object(map) = action {
        // With no target constraints an object action always validates.
        assert!(unconstrained.is_ok());

        // Requirements drawn from the action itself always match it.
        let mut requirements =
            ExecutionRequirements::new("disciplinary", "member_suspension");
        for (key, value) in &map {
            requirements = requirements.expect_target(key.clone(), value.clone());
        }
        assert!(validate_for_execution(&resolution, &[], &requirements).is_ok());
    } else {
        // Anything but an object counts as a missing proposed action.
        assert!(unconstrained.is_err());
    }
});
