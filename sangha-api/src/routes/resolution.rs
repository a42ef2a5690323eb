//! Resolution REST API Routes
//!
//! Read-side eligibility checks for resolution-gated actions. The execute
//! path itself lives with the action domains; this surface lets clients ask
//! "could this resolution authorize that action right now" and render the
//! reason when it cannot.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use sangha_mandate::validate_for_execution;
use sangha_store::DirectoryStore;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::Identity,
    state::AppState,
    types::{ValidateResolutionRequest, ValidateResolutionResponse},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/resolutions/{id}/validate - Check execution eligibility
#[utoipa::path(
    post,
    path = "/api/v1/resolutions/{id}/validate",
    tag = "Resolutions",
    params(
        ("id" = Uuid, Path, description = "Resolution ID")
    ),
    request_body = ValidateResolutionRequest,
    responses(
        (status = 200, description = "Eligibility verdict", body = ValidateResolutionResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Resolution not found", body = ApiError),
    ),
    security(
        ("identity" = [])
    )
)]
pub async fn validate_resolution(
    State(state): State<AppState>,
    Identity(_user): Identity,
    Path(id): Path<Uuid>,
    Json(req): Json<ValidateResolutionRequest>,
) -> ApiResult<impl IntoResponse> {
    // Validate required fields
    if req.resolution_type.trim().is_empty() {
        return Err(ApiError::missing_field("resolution_type"));
    }
    if req.category.trim().is_empty() {
        return Err(ApiError::missing_field("category"));
    }

    let resolution = state
        .store
        .resolution_get(id)?
        .ok_or_else(|| ApiError::resolution_not_found(id))?;
    let appeals = state.store.appeal_list_by_resolution(id)?;

    let requirements = req.into_requirements();
    let response = match validate_for_execution(&resolution, &appeals, &requirements) {
        Ok(()) => ValidateResolutionResponse {
            valid: true,
            error: None,
        },
        Err(e) => ValidateResolutionResponse {
            valid: false,
            error: Some(e.to_string()),
        },
    };

    Ok(Json(response))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the resolution routes router.
pub fn create_router() -> Router<AppState> {
    Router::new().route("/:id/validate", post(validate_resolution))
}

// ============================================================================
// TESTS
// ============================================================================
