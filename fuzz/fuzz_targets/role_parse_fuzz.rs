//! Fuzz test for role string parsing
//!
//! Role strings arrive verbatim from identity headers, so the parser must
//! accept arbitrary input. This fuzz target feeds it arbitrary byte
//! sequences to find:
//! - Panics or crashes
//! - Violations of the invariants between the parsed fields and the input
//!
//! Run with: cargo +nightly fuzz run role_parse_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use sangha_core::{BaseRole, OrgLevel, Role};

fuzz_target!(|data: &[u8]| {
    // Headers are validated as UTF-8 before parsing; mirror that here.
    if let Ok(input) = std::str::from_utf8(data) {
        let role = Role::parse(input, "super_admin");

        // Basic invariants that should always hold:
        // 1. The stored raw form is the trimmed input.
        assert_eq!(role.raw, input.trim());

        // 2. The super-admin comparison is case-insensitive.
        if input.trim().eq_ignore_ascii_case("super_admin") {
            assert_eq!(role.base, BaseRole::SuperAdmin);
        }

        // 3. A parsed level implies its fragment appears in the input.
        if let Some(level) = role.level {
            assert!(
                input.to_lowercase().contains(level.as_str()),
                "level {level} parsed from input without its fragment"
            );
        }

        // 4. Override verdicts follow the parsed fields alone.
        for level in [
            None,
            Some(OrgLevel::State),
            Some(OrgLevel::District),
            Some(OrgLevel::Tehsil),
        ] {
            let expected =
                role.is_super_admin() || (role.level.is_some() && role.level == level);
            assert_eq!(role.can_override_at(level), expected);
        }
    }
});
