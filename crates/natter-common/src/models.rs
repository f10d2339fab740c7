//! Data models for natter.
//!
//! These types are both the persisted records and their JSON wire form. Field
//! names follow the document-store conventions the web client already speaks:
//! `_id` for identifiers and camelCase timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── User ────────────────────────────────────────────────────────────

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user, embedded in group messages. Never carries the
/// password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            created_at: user.created_at,
        }
    }
}

// ── Message body ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub text: String,
}

/// Message content as accepted on input: either a bare string or a
/// `{ "text": ... }` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageInput {
    Text(String),
    Body(MessageBody),
}

impl MessageInput {
    pub fn into_body(self) -> MessageBody {
        match self {
            MessageInput::Text(text) => MessageBody { text },
            MessageInput::Body(body) => body,
        }
    }
}

// ── Group chat ──────────────────────────────────────────────────────

/// One entry in the shared group feed. Owned by `participant`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub message: MessageBody,
    pub participant: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Private chat ────────────────────────────────────────────────────

/// One message in a two-party conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub message: MessageBody,
    pub participants: [String; 2],
    pub sender: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrivateMessage {
    /// True when both `a` and `b` are participants, in either order.
    pub fn involves(&self, a: &str, b: &str) -> bool {
        let has = |id: &str| self.participants.iter().any(|p| p == id);
        has(a) && has(b)
    }

    /// Project this message from the point of view of `viewer`.
    pub fn view_for(&self, viewer: &str) -> ConversationEntry {
        ConversationEntry {
            from_self: self.sender == viewer,
            message: self.message.text.clone(),
        }
    }
}

/// A private message as seen by one side of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    #[serde(rename = "fromSelf")]
    pub from_self: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private(sender: &str, to: &str, text: &str) -> PrivateMessage {
        let now = Utc::now();
        PrivateMessage {
            id: "pmsg_1".into(),
            message: MessageBody { text: text.into() },
            participants: [sender.into(), to.into()],
            sender: sender.into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn message_input_accepts_string_or_object() {
        let bare: MessageInput = serde_json::from_str(r#""hello""#).unwrap();
        let object: MessageInput = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(bare.into_body(), object.into_body());
    }

    #[test]
    fn involves_ignores_order() {
        let msg = private("usr_a", "usr_b", "hi");
        assert!(msg.involves("usr_a", "usr_b"));
        assert!(msg.involves("usr_b", "usr_a"));
        assert!(!msg.involves("usr_a", "usr_c"));
    }

    #[test]
    fn view_is_relative_to_viewer() {
        let msg = private("usr_a", "usr_b", "hi");
        assert!(msg.view_for("usr_a").from_self);
        assert!(!msg.view_for("usr_b").from_self);
        assert_eq!(msg.view_for("usr_b").message, "hi");
    }

    #[test]
    fn user_serialization_hides_password() {
        let user = User {
            id: "usr_1".into(),
            username: "alice".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], "usr_1");
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn conversation_entry_uses_from_self_key() {
        let json = serde_json::to_value(private("usr_a", "usr_b", "hi").view_for("usr_a")).unwrap();
        assert_eq!(json, serde_json::json!({ "fromSelf": true, "message": "hi" }));
    }
}
