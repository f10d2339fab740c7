//! Group chat endpoints.
//!
//! GET  /api/group-chat — list the whole feed (public)
//! POST /api/group-chat — post as `p_user`
//! PUT  /api/group-chat — edit one of the caller's own messages

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use natter_common::models::{GroupMessage, MessageInput};

use crate::state::AppState;
use crate::store::Target;

use super::access::require_owner;
use super::auth_extractor::AuthUser;
use super::error::ApiError;
use super::message_body;
use super::response::{ok, respond, ApiJson, ApiResult, MessageData, MessagesData};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_chat).post(add_chat).put(update_public_message),
    )
}

#[derive(Debug, Deserialize)]
pub struct ParticipantRef {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddChatRequest {
    pub p_user: ParticipantRef,
    pub message: MessageInput,
}

async fn add_chat(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<AddChatRequest>,
) -> ApiResult<MessageData<GroupMessage>> {
    require_owner(&user, &body.p_user.id)?;
    let message = message_body(body.message)?;

    let record = state
        .store()
        .insert_group_message(&user.user_id, message)
        .await?;

    tracing::info!(message_id = %record.id, user_id = %user.user_id, "group message posted");

    ok(MessageData { message: record })
}

async fn get_chat(State(state): State<AppState>) -> ApiResult<MessagesData<GroupMessage>> {
    let messages = state.store().list_group_messages().await?;
    ok(MessagesData { messages })
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    /// Message to edit; the caller's most recent one when absent.
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub message: MessageInput,
}

async fn update_public_message(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<UpdateMessageRequest>,
) -> ApiResult<MessageData<GroupMessage>> {
    let message = message_body(body.message)?;

    let record = state
        .store()
        .update_group_message(&user.user_id, Target::from(body.id.as_deref()), message)
        .await?
        .ok_or_else(|| ApiError::not_found("no group message owned by caller"))?;

    tracing::info!(message_id = %record.id, user_id = %user.user_id, "group message updated");

    respond(StatusCode::OK, "Message updated", MessageData { message: record })
}
