//! REST API Routes Module
//!
//! Route handlers organized by surface:
//! - Authorization checks and portfolio switching under /api/v1/authz
//! - Resolution eligibility under /api/v1/resolutions
//! - Health check endpoints (Kubernetes-compatible) under /health
//! - CORS support for browser-based clients

pub mod authz;
pub mod health;
pub mod resolution;

use axum::{
    http::{header, header::HeaderName, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::middleware::{
    identity_middleware, IdentityState, MEMBER_HEADER, ROLE_HEADER, TEHSIL_HEADER, USER_HEADER,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

// Re-export route creation functions for convenience
pub use authz::create_router as authz_router;
pub use health::create_router as health_router;
pub use resolution::create_router as resolution_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// ROUTER ASSEMBLY
// ============================================================================

/// Create the complete API router.
///
/// - Authorization routes under /api/v1/authz (identity required)
/// - Resolution eligibility under /api/v1/resolutions (identity required)
/// - Health checks at /health/* (public)
/// - OpenAPI spec at /openapi.json (public)
pub fn create_api_router(state: AppState, identity: IdentityState) -> Router {
    // Protected routes (identity headers required)
    let api_routes = Router::new()
        .nest("/authz", authz::create_router())
        .nest("/resolutions", resolution::create_router())
        .layer(from_fn_with_state(identity, identity_middleware));

    Router::new()
        .nest("/api/v1", api_routes)
        // Health checks (no identity required)
        .nest("/health", health::create_router())
        // OpenAPI spec
        .route("/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// CORS for browser-based clients. The identity headers must be listed or
/// preflights for authenticated calls fail.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(USER_HEADER),
            HeaderName::from_static(ROLE_HEADER),
            HeaderName::from_static(MEMBER_HEADER),
            HeaderName::from_static(TEHSIL_HEADER),
        ])
        .allow_origin(Any)
}

// ============================================================================
// TESTS
// ============================================================================
