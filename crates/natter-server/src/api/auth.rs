//! Account endpoints.
//!
//! POST /api/auth/register — create a new user
//! POST /api/auth/login    — exchange credentials for a JWT

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use natter_common::auth;

use crate::state::AppState;

use super::error::ApiError;
use super::response::{ok, respond, ApiJson, ApiResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    let len_ok = (3..=32).contains(&username.len());
    let chars_ok = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if len_ok && chars_ok {
        Ok(())
    } else {
        Err(ApiError::validation(
            "username must be 3-32 characters of letters, digits, '_', '.' or '-'",
        ))
    }
}

// ── Register ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub username: String,
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<RegisterResponse> {
    validate_username(&body.username)?;
    if body.password.len() < 8 {
        return Err(ApiError::validation(
            "password must be at least 8 characters",
        ));
    }

    let password_hash = auth::hash_password(&body.password)?;
    let user = state
        .store()
        .create_user(&body.username, &password_hash)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    respond(
        StatusCode::CREATED,
        "User registered",
        RegisterResponse {
            user_id: user.id,
            username: user.username,
        },
    )
}

// ── Login ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let user = state
        .store()
        .find_user_by_username(&body.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid username or password"))?;

    if !auth::verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("invalid username or password"));
    }

    let token = state.jwt().issue(&user.id, state.token_ttl_secs())?;

    tracing::info!(user_id = %user.id, "user logged in");

    ok(LoginResponse {
        token,
        user_id: user.id,
    })
}
