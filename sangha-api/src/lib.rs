//! SANGHA API - HTTP Binding for the Authorization Core
//!
//! This crate exposes the portfolio authorization gate and resolution
//! eligibility checks as a REST API (Axum). Identity arrives as forwarded
//! headers from an authenticating gateway; the API parses them once, runs
//! the requested check against the in-memory directory, and maps domain
//! errors onto HTTP statuses.

pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{
    identity_middleware, Identity, IdentityState, MEMBER_HEADER, ROLE_HEADER, TEHSIL_HEADER,
    USER_HEADER,
};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
