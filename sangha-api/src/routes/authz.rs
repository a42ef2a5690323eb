//! Authorization REST API Routes
//!
//! The HTTP surface of the authorization gate: permission checks, active
//! portfolio switching, route listings for menu rendering, and the caller's
//! effective organizational level. All handlers require the identity
//! middleware.

use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sangha_authz::EffectiveLevel;

use crate::{
    error::{ApiError, ApiResult},
    middleware::Identity,
    state::AppState,
    types::{
        AuthzCheckRequest, AuthzCheckResponse, RoutesResponse, SwitchPortfolioRequest,
        SwitchPortfolioResponse,
    },
};

/// Header set by proxies with the original client address, used for override
/// audit records.
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/authz/check - Check a permission and obtain a grant
#[utoipa::path(
    post,
    path = "/api/v1/authz/check",
    tag = "Authorization",
    request_body = AuthzCheckRequest,
    responses(
        (status = 200, description = "Authorization granted", body = AuthzCheckResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Authorization denied", body = ApiError),
    ),
    security(
        ("identity" = [])
    )
)]
pub async fn check_authorization(
    State(state): State<AppState>,
    Identity(user): Identity,
    headers: HeaderMap,
    Json(req): Json<AuthzCheckRequest>,
) -> ApiResult<impl IntoResponse> {
    // Validate required fields
    if req.permission_key.trim().is_empty() {
        return Err(ApiError::missing_field("permission_key"));
    }

    let forwarded_for = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|raw| raw.split(',').next().unwrap_or(raw).trim().to_string());

    let request = req.into_authz_request(forwarded_for);
    let grant = state.gate.authorize(&user, &request)?;

    Ok(Json(AuthzCheckResponse {
        granted: true,
        grant,
    }))
}

/// POST /api/v1/authz/switch - Switch the caller's active portfolio
#[utoipa::path(
    post,
    path = "/api/v1/authz/switch",
    tag = "Authorization",
    request_body = SwitchPortfolioRequest,
    responses(
        (status = 200, description = "Active portfolio switched", body = SwitchPortfolioResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Position not found or not switchable", body = ApiError),
    ),
    security(
        ("identity" = [])
    )
)]
pub async fn switch_portfolio(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(req): Json<SwitchPortfolioRequest>,
) -> ApiResult<impl IntoResponse> {
    let switched = state
        .gate
        .service()
        .switch_active_portfolio(&user, req.position_id)?;

    if !switched {
        return Err(ApiError::position_not_found(req.position_id));
    }

    Ok(Json(SwitchPortfolioResponse { switched: true }))
}

/// GET /api/v1/authz/routes - Route names unlocked by the active portfolio
#[utoipa::path(
    get,
    path = "/api/v1/authz/routes",
    tag = "Authorization",
    responses(
        (status = 200, description = "Accessible route names", body = RoutesResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(
        ("identity" = [])
    )
)]
pub async fn list_user_routes(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<impl IntoResponse> {
    let routes = state.gate.service().user_routes(&user)?;
    let routes: Vec<String> = routes.into_iter().collect();
    let total = routes.len() as i32;

    Ok(Json(RoutesResponse { routes, total }))
}

/// GET /api/v1/authz/effective-level - The caller's effective level
#[utoipa::path(
    get,
    path = "/api/v1/authz/effective-level",
    tag = "Authorization",
    responses(
        (status = 200, description = "Effective organizational level", body = EffectiveLevel),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(
        ("identity" = [])
    )
)]
pub async fn get_effective_level(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<EffectiveLevel>> {
    let level = state.gate.effective_level(&user)?;
    Ok(Json(level))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the authorization routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/check", post(check_authorization))
        .route("/switch", post(switch_portfolio))
        .route("/routes", get(list_user_routes))
        .route("/effective-level", get(get_effective_level))
}

// ============================================================================
// TESTS
// ============================================================================
