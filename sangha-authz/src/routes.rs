//! Permission-to-route expansion
//!
//! Maps dotted permission keys to the route names they unlock. Templates may
//! carry a `{level}` placeholder that is substituted with the level the
//! permission is evaluated at, so one grant row covers the state, district,
//! and tehsil variants of a page.

use sangha_core::OrgLevel;
use std::collections::{BTreeSet, HashMap};

/// Built-in table shipped with the platform. Deployments extend or replace
/// entries through [`RouteTable::insert`].
const DEFAULT_ROUTES: &[(&str, &[&str])] = &[
    (
        "member.view",
        &["{level}.members.index", "{level}.members.show"],
    ),
    (
        "member.approve",
        &["{level}.members.approve", "{level}.members.show"],
    ),
    ("member.suspend", &["{level}.members.suspend"]),
    (
        "election.view",
        &["{level}.elections.index", "{level}.elections.show"],
    ),
    ("election.create", &["{level}.elections.create"]),
    (
        "election.manage",
        &[
            "{level}.elections.edit",
            "{level}.elections.certify",
            "{level}.elections.show",
        ],
    ),
    (
        "resolution.view",
        &["{level}.resolutions.index", "{level}.resolutions.show"],
    ),
    (
        "resolution.execute",
        &["{level}.resolutions.execute", "{level}.resolutions.show"],
    ),
    (
        "grievance.review",
        &["{level}.grievances.index", "{level}.grievances.review"],
    ),
    (
        "transfer.approve",
        &["{level}.transfers.index", "{level}.transfers.approve"],
    ),
    ("report.view", &["{level}.reports.index"]),
];

/// Placeholder substituted with the evaluation level.
const LEVEL_PLACEHOLDER: &str = "{level}";

/// Static permission-key to route-name-template map.
///
/// Seeded from the built-in table; callers may add or replace entries before
/// handing the table to the authorization service. Lookups for unknown keys
/// expand to nothing rather than erroring, since grant rows and route names
/// are maintained as separate master data.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Vec<String>>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Create a table seeded with the built-in entries.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (key, templates) in DEFAULT_ROUTES {
            table.insert(*key, templates.iter().map(|t| t.to_string()).collect());
        }
        table
    }

    /// Add or replace the templates for a permission key.
    pub fn insert(&mut self, permission_key: impl Into<String>, templates: Vec<String>) {
        self.routes.insert(permission_key.into(), templates);
    }

    /// Number of permission keys in the table.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route names for one permission key at a level. Unknown keys expand
    /// to an empty list.
    pub fn routes_for(&self, permission_key: &str, level: OrgLevel) -> Vec<String> {
        self.routes
            .get(permission_key)
            .map(|templates| {
                templates
                    .iter()
                    .map(|t| t.replace(LEVEL_PLACEHOLDER, level.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Expand a set of permission keys at a level, de-duplicated. Templates
    /// shared between keys appear once.
    pub fn expand<'a, I>(&self, permission_keys: I, level: OrgLevel) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        permission_keys
            .into_iter()
            .flat_map(|key| self.routes_for(key, level))
            .collect()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_substitutes_level() {
        let table = RouteTable::with_defaults();
        let routes = table.routes_for("member.approve", OrgLevel::District);
        assert_eq!(
            routes,
            vec![
                "district.members.approve".to_string(),
                "district.members.show".to_string(),
            ]
        );
    }

    #[test]
    fn test_unknown_key_expands_to_nothing() {
        let table = RouteTable::with_defaults();
        assert!(table.routes_for("member.promote", OrgLevel::State).is_empty());
    }

    #[test]
    fn test_expand_dedups_shared_routes() {
        let table = RouteTable::with_defaults();
        // Both keys expand to "{level}.members.show".
        let routes = table.expand(["member.view", "member.approve"], OrgLevel::Tehsil);
        assert_eq!(
            routes.iter().filter(|r| *r == "tehsil.members.show").count(),
            1
        );
        assert_eq!(routes.len(), 3);
    }

    #[test]
    fn test_expand_empty_keys_is_empty() {
        let table = RouteTable::with_defaults();
        assert!(table.expand([], OrgLevel::State).is_empty());
    }

    #[test]
    fn test_insert_replaces_default_entry() {
        let mut table = RouteTable::with_defaults();
        table.insert(
            "member.view",
            vec!["{level}.members.dashboard".to_string()],
        );
        assert_eq!(
            table.routes_for("member.view", OrgLevel::State),
            vec!["state.members.dashboard".to_string()]
        );
    }

    #[test]
    fn test_insert_extends_table() {
        let mut table = RouteTable::new();
        assert!(table.is_empty());
        table.insert("audit.view", vec!["{level}.audits.index".to_string()]);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.routes_for("audit.view", OrgLevel::Tehsil),
            vec!["tehsil.audits.index".to_string()]
        );
    }

    #[test]
    fn test_no_placeholder_survives_expansion() {
        let table = RouteTable::with_defaults();
        for (key, _) in DEFAULT_ROUTES {
            for level in [OrgLevel::State, OrgLevel::District, OrgLevel::Tehsil] {
                for route in table.routes_for(key, level) {
                    assert!(
                        !route.contains(LEVEL_PLACEHOLDER),
                        "unexpanded placeholder in {route}"
                    );
                    assert!(route.starts_with(level.as_str()));
                }
            }
        }
    }
}
