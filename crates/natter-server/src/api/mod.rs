//! REST API route tree.

pub mod access;
pub mod auth;
pub mod auth_extractor;
pub mod error;
pub mod group_chat;
pub mod private_chat;
pub mod response;

use axum::Router;

use natter_common::models::{MessageBody, MessageInput};

use crate::state::AppState;

use self::error::ApiError;

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/group-chat", group_chat::router())
        .nest("/private-chat", private_chat::router())
}

/// Normalize message input and reject blank text.
pub(crate) fn message_body(input: MessageInput) -> Result<MessageBody, ApiError> {
    let body = input.into_body();
    if body.text.trim().is_empty() {
        return Err(ApiError::validation("message text must not be empty"));
    }
    Ok(body)
}
