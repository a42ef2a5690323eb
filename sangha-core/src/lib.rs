//! SANGHA Core - Entity Types
//!
//! Pure data structures for the membership platform's authorization core.
//! All other crates depend on this. This crate contains the domain types,
//! enums, grant flags, the parsed role model, and the error taxonomy - no
//! I/O and no storage.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod grants;
pub mod identity;
pub mod role;

pub use config::AuthzConfig;
pub use entities::{
    AdminOverrideLog, Appeal, AuthzTarget, Election, ElectionCommission, LeadershipPosition,
    Member, Portfolio, PortfolioPermission, Resolution,
};
pub use enums::{
    AppealStatus, CommissionRole, EntityType, MemberStatus, OrgLevel, PermissionAction,
    PortfolioType, ResolutionStatus,
};
pub use error::{
    AuthzError, ConfigError, EligibilityError, MandateError, SanghaError, SanghaResult,
    StoreError,
};
pub use grants::ActionGrants;
pub use identity::{
    new_entity_id, AppealId, CommissionId, ElectionId, EntityId, LogId, MemberId, PortfolioId,
    PositionId, ResolutionId, Timestamp, UserId,
};
pub use role::{AuthenticatedUser, BaseRole, Role};
