//! Permission grant flags

use crate::enums::PermissionAction;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Grant flags on a portfolio permission row.
    ///
    /// One bit per action kind; a permission row allows an action iff the
    /// corresponding bit is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ActionGrants: u8 {
        /// Holder may read the resource
        const READ = 0b0000_0001;
        /// Holder may create or modify the resource
        const WRITE = 0b0000_0010;
        /// Holder may execute the guarded operation
        const EXECUTE = 0b0000_0100;
        /// Holder may delete the resource
        const DELETE = 0b0000_1000;
    }
}

impl ActionGrants {
    /// Check whether the flags grant the given action.
    pub fn allows(&self, action: PermissionAction) -> bool {
        self.contains(ActionGrants::from(action))
    }
}

impl Default for ActionGrants {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<PermissionAction> for ActionGrants {
    fn from(action: PermissionAction) -> Self {
        match action {
            PermissionAction::Read => ActionGrants::READ,
            PermissionAction::Write => ActionGrants::WRITE,
            PermissionAction::Execute => ActionGrants::EXECUTE,
            PermissionAction::Delete => ActionGrants::DELETE,
        }
    }
}

// Manual serde implementation for ActionGrants (bitflags 2.x + serde)
impl Serialize for ActionGrants {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ActionGrants {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid ActionGrants bits: {:#04x}", bits))
        })
    }
}

#[cfg(feature = "openapi")]
impl utoipa::ToSchema for ActionGrants {
    fn name() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("ActionGrants")
    }
}

#[cfg(feature = "openapi")]
impl utoipa::PartialSchema for ActionGrants {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        utoipa::openapi::ObjectBuilder::new()
            .schema_type(utoipa::openapi::schema::SchemaType::Type(
                utoipa::openapi::schema::Type::Integer,
            ))
            .description(Some("Permission grant flags as a u8 bitfield (0-15)"))
            .minimum(Some(0.0))
            .maximum(Some(15.0))
            .into()
    }
}

// =============================================================================
// TESTS
// =============================================================================
