//! Identity Middleware
//!
//! The Sangha API sits behind an authenticating gateway that forwards the
//! caller's identity as headers. This middleware parses them into an
//! `AuthenticatedUser` (the role string parsed exactly once) and injects it
//! into request extensions:
//!
//! - `x-sangha-user` - account id (required)
//! - `x-sangha-role` - raw role string (required)
//! - `x-sangha-member` - linked member id (optional)
//! - `x-sangha-tehsil` - the user's own tehsil id (optional)
//!
//! Requests without the required headers are rejected with 401.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use sangha_core::{AuthenticatedUser, AuthzConfig, Role};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated account id.
pub const USER_HEADER: &str = "x-sangha-user";
/// Header carrying the raw role string.
pub const ROLE_HEADER: &str = "x-sangha-role";
/// Header carrying the linked member id.
pub const MEMBER_HEADER: &str = "x-sangha-member";
/// Header carrying the user's own tehsil id.
pub const TEHSIL_HEADER: &str = "x-sangha-tehsil";

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for the identity middleware.
#[derive(Debug, Clone)]
pub struct IdentityState {
    config: Arc<AuthzConfig>,
}

impl IdentityState {
    /// Create middleware state around the authorization configuration.
    pub fn new(config: AuthzConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Axum middleware that turns forwarded identity headers into an
/// `AuthenticatedUser` extension.
///
/// Returns 401 when the required headers are absent and 400 when an id
/// header is not a UUID.
pub async fn identity_middleware(
    State(state): State<IdentityState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = parse_identity_headers(request.headers(), &state.config)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn parse_identity_headers(
    headers: &HeaderMap,
    config: &AuthzConfig,
) -> Result<AuthenticatedUser, ApiError> {
    let user_id = required_uuid(headers, USER_HEADER)?;
    let role_raw = header_str(headers, ROLE_HEADER).ok_or_else(|| {
        ApiError::unauthorized(format!("Identity header '{}' is required", ROLE_HEADER))
    })?;

    let role = Role::parse(role_raw, &config.super_admin_role);
    let mut user = AuthenticatedUser::new(user_id, role);

    if let Some(member_id) = optional_uuid(headers, MEMBER_HEADER)? {
        user = user.with_member_id(member_id);
    }
    if let Some(tehsil_id) = optional_uuid(headers, TEHSIL_HEADER)? {
        user = user.with_tehsil_id(tehsil_id);
    }

    Ok(user)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn required_uuid(headers: &HeaderMap, name: &str) -> Result<Uuid, ApiError> {
    let raw = header_str(headers, name).ok_or_else(|| {
        ApiError::unauthorized(format!("Identity header '{}' is required", name))
    })?;
    raw.parse::<Uuid>()
        .map_err(|_| ApiError::invalid_format(name, "UUID"))
}

fn optional_uuid(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, ApiError> {
    match header_str(headers, name) {
        Some(raw) => raw
            .parse::<Uuid>()
            .map(Some)
            .map_err(|_| ApiError::invalid_format(name, "UUID")),
        None => Ok(None),
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for the authenticated identity.
///
/// Implements `FromRequestParts`, so handlers declare the identity they need
/// in their signature and the type system guarantees the middleware ran:
///
/// ```ignore
/// async fn handler(Identity(user): Identity) -> impl IntoResponse {
///     Json(user.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Identity)
            .ok_or_else(|| {
                ApiError::internal_error(
                    "AuthenticatedUser not found in request extensions. \
                     Ensure identity_middleware is applied to this route.",
                )
            })
    }
}

impl std::ops::Deref for Identity {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Json, Router,
    };
    use tower::ServiceExt; // for `oneshot`
    use uuid::Uuid;

    async fn whoami(Identity(user): Identity) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "user_id": user.user_id,
            "role": user.role.raw,
            "member_id": user.member_id,
            "tehsil_id": user.tehsil_id,
        }))
    }

    fn test_app() -> Router {
        let identity_state = IdentityState::new(AuthzConfig::default());
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(
                identity_state,
                identity_middleware,
            ))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_headers_rejected() {
        let app = test_app();
        let request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_role_rejected() {
        let app = test_app();
        let request = Request::builder()
            .uri("/whoami")
            .header(USER_HEADER, Uuid::now_v7().to_string())
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_headers_injected() {
        let app = test_app();
        let user_id = Uuid::now_v7();
        let member_id = Uuid::now_v7();

        let request = Request::builder()
            .uri("/whoami")
            .header(USER_HEADER, user_id.to_string())
            .header(ROLE_HEADER, "district_admin")
            .header(MEMBER_HEADER, member_id.to_string())
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["user_id"], serde_json::json!(user_id));
        assert_eq!(body["role"], "district_admin");
        assert_eq!(body["member_id"], serde_json::json!(member_id));
        assert_eq!(body["tehsil_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_user_id_rejected() {
        let app = test_app();
        let request = Request::builder()
            .uri("/whoami")
            .header(USER_HEADER, "not-a-uuid")
            .header(ROLE_HEADER, "member")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_optional_header_rejected() {
        let app = test_app();
        let request = Request::builder()
            .uri("/whoami")
            .header(USER_HEADER, Uuid::now_v7().to_string())
            .header(ROLE_HEADER, "member")
            .header(TEHSIL_HEADER, "garbage")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_custom_super_admin_role_respected() {
        let config = AuthzConfig {
            super_admin_role: "national_secretary".to_string(),
            ..AuthzConfig::default()
        };
        let headers = {
            let mut headers = HeaderMap::new();
            headers.insert(USER_HEADER, Uuid::now_v7().to_string().parse().unwrap());
            headers.insert(ROLE_HEADER, "national_secretary".parse().unwrap());
            headers
        };

        let user = parse_identity_headers(&headers, &config).unwrap();
        assert!(user.role.is_super_admin());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use sangha_test_utils::generators::arb_role_string;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any role string the identity layer can produce parses without
        /// panicking and round-trips into the user's raw role.
        #[test]
        fn prop_any_role_string_parses(raw in arb_role_string()) {
            let mut headers = HeaderMap::new();
            headers.insert(USER_HEADER, Uuid::nil().to_string().parse().unwrap());
            if let Ok(value) = raw.parse() {
                headers.insert(ROLE_HEADER, value);
                let user = parse_identity_headers(&headers, &AuthzConfig::default()).unwrap();
                prop_assert_eq!(user.role.raw, raw);
            }
        }
    }
}
