//! SANGHA Authz - Portfolio Authorization
//!
//! Authorization for the membership platform, evaluated through leadership
//! portfolios: every member acts through at most one *active* position at a
//! time, and permissions are grant rows keyed by that position's portfolio.
//!
//! # Components
//!
//! - [`PortfolioAuthorizationService`]: active-position resolution,
//!   permission checks, the atomic active-portfolio switch, route expansion,
//!   and usage recording.
//! - [`AuthorizationGate`]: the caller-facing entry point layering the
//!   admin-override fallback (audited) and the effective-level and
//!   hierarchical-authority checks on top of the service.
//! - [`RouteTable`]: static permission-key to route-name map with `{level}`
//!   substitution.
//! - Lifecycle operations ([`assign_position`], [`end_position`],
//!   [`remove_position`]) and their hooks, which keep Election Commission
//!   membership mirrored from EC-type positions.
//!
//! Everything reads and writes through the [`sangha_store::DirectoryStore`]
//! seam; nothing here performs I/O of its own.

mod gate;
mod lifecycle;
mod routes;
mod service;

pub use gate::{
    AuthorizationGate, AuthzGrant, AuthzRequest, EffectiveLevel, EffectiveLevelSource,
};
pub use lifecycle::{
    assign_position, end_position, position_created, position_deleted, position_updated,
    remove_position,
};
pub use routes::RouteTable;
pub use service::PortfolioAuthorizationService;

// Re-export core types for convenience
pub use sangha_core::{
    AuthenticatedUser, AuthzConfig, AuthzError, AuthzTarget, OrgLevel, PermissionAction, Role,
};
