//! Identity types for Sangha entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// Semantic aliases. All identifiers share the same representation; the
// aliases keep signatures readable where several id kinds meet.
pub type MemberId = EntityId;
pub type PortfolioId = EntityId;
pub type PositionId = EntityId;
pub type ResolutionId = EntityId;
pub type AppealId = EntityId;
pub type ElectionId = EntityId;
pub type CommissionId = EntityId;
pub type LogId = EntityId;
pub type UserId = EntityId;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}
