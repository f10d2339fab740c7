//! Private (two-party) chat endpoints.
//!
//! POST   /api/private-chat         — send `from` → `to`
//! POST   /api/private-chat/history — read the `from`/`to` conversation
//! PUT    /api/private-chat         — edit one of the caller's sent messages
//! DELETE /api/private-chat         — delete the whole conversation with `to`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use natter_common::models::{ConversationEntry, MessageInput, PrivateMessage};

use crate::config::HistoryVisibility;
use crate::state::AppState;
use crate::store::Target;

use super::access::{require_owner, require_participant};
use super::auth_extractor::{AuthRejection, AuthUser};
use super::error::ApiError;
use super::message_body;
use super::response::{ok, respond, ApiJson, ApiResult, MessageData, MessagesData};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(add_message)
                .put(update_private_message)
                .delete(delete_all_private_chat),
        )
        .route("/history", post(get_all_message))
}

fn distinct_parties(a: &str, b: &str) -> Result<(), ApiError> {
    if a.is_empty() || b.is_empty() {
        return Err(ApiError::validation("both participants are required"));
    }
    if a == b {
        return Err(ApiError::validation(
            "a private conversation needs two different users",
        ));
    }
    Ok(())
}

// ── Send ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    pub from: String,
    pub to: String,
    pub message: MessageInput,
}

async fn add_message(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<AddMessageRequest>,
) -> ApiResult<MessageData<PrivateMessage>> {
    require_owner(&user, &body.from)?;
    distinct_parties(&body.from, &body.to)?;
    let message = message_body(body.message)?;

    let record = state
        .store()
        .insert_private_message(&body.from, &body.to, message)
        .await?;

    tracing::info!(message_id = %record.id, user_id = %user.user_id, "private message sent");

    ok(MessageData { message: record })
}

// ── History ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub from: String,
    pub to: String,
}

/// Under the participants policy the bearer is checked before the body is
/// parsed.
async fn get_all_message(
    State(state): State<AppState>,
    auth: Result<AuthUser, AuthRejection>,
    body: Result<ApiJson<ConversationRequest>, ApiError>,
) -> ApiResult<MessagesData<ConversationEntry>> {
    let caller = match state.history_visibility() {
        HistoryVisibility::Participants => Some(auth?),
        HistoryVisibility::Public => None,
    };
    let ApiJson(body) = body?;
    if let Some(user) = caller {
        require_participant(&user, &body.from, &body.to)?;
    }
    distinct_parties(&body.from, &body.to)?;

    let messages = state
        .store()
        .list_conversation(&body.from, &body.to)
        .await?
        .iter()
        .map(|msg| msg.view_for(&body.from))
        .collect();

    ok(MessagesData { messages })
}

// ── Delete ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteConversationRequest {
    pub to: String,
}

async fn delete_all_private_chat(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<DeleteConversationRequest>,
) -> ApiResult<MessagesData<ConversationEntry>> {
    distinct_parties(&user.user_id, &body.to)?;

    let removed = state
        .store()
        .delete_conversation(&user.user_id, &body.to)
        .await?;

    tracing::info!(user_id = %user.user_id, peer = %body.to, removed, "private chat deleted");

    respond(
        StatusCode::OK,
        "Chat is deleted",
        MessagesData {
            messages: Vec::new(),
        },
    )
}

// ── Update ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    /// Message to edit; the caller's most recently sent one when absent.
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub message: MessageInput,
}

async fn update_private_message(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<UpdateMessageRequest>,
) -> ApiResult<MessageData<PrivateMessage>> {
    let message = message_body(body.message)?;

    let record = state
        .store()
        .update_private_message(&user.user_id, Target::from(body.id.as_deref()), message)
        .await?
        .ok_or_else(|| ApiError::not_found("no private message sent by caller"))?;

    tracing::info!(message_id = %record.id, user_id = %user.user_id, "private message updated");

    respond(StatusCode::OK, "Message updated", MessageData { message: record })
}
