//! JWT bearer token extraction for authenticated routes.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use natter_common::auth::JwtContext;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Verified caller identity, produced from the `Authorization: Bearer <jwt>`
/// header before any handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Missing,
    Invalid,
}

/// Decode the bearer token carried in `headers`.
pub fn authenticate(jwt: &JwtContext, headers: &HeaderMap) -> Result<AuthUser, AuthRejection> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthRejection::Missing)?;

    let claims = jwt.verify_token(token).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        AuthRejection::Invalid
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        authenticate(app_state.jwt(), &parts.headers)
    }
}

impl From<AuthRejection> for ApiError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::Missing => ApiError::unauthorized("missing authorization header"),
            AuthRejection::Invalid => ApiError::unauthorized("invalid or expired token"),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
