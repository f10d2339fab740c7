//! Persistence seam for chat records.
//!
//! Every handler performs exactly one call against a [`ChatStore`]. Two
//! implementations exist: [`PgStore`] for PostgreSQL and [`MemoryStore`]
//! for development and tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use natter_common::models::{GroupMessage, MessageBody, PrivateMessage, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("username already taken: {0}")]
    DuplicateUsername(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Record lookup used by the update operations: a specific message owned by
/// the caller, or the caller's most recently created one.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Latest,
    Id(&'a str),
}

impl<'a> From<Option<&'a str>> for Target<'a> {
    fn from(id: Option<&'a str>) -> Self {
        id.map_or(Target::Latest, Target::Id)
    }
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    // ── Users ───────────────────────────────────────────────────────

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    // ── Group chat ──────────────────────────────────────────────────

    /// Fails with [`StoreError::UnknownUser`] if `participant_id` does not exist.
    async fn insert_group_message(
        &self,
        participant_id: &str,
        body: MessageBody,
    ) -> Result<GroupMessage, StoreError>;

    /// All group messages, `updated_at` ascending, ties broken by ID.
    async fn list_group_messages(&self) -> Result<Vec<GroupMessage>, StoreError>;

    /// Replace the body of a message owned by `owner_id`. `None` when the
    /// caller owns no matching message.
    async fn update_group_message(
        &self,
        owner_id: &str,
        target: Target<'_>,
        body: MessageBody,
    ) -> Result<Option<GroupMessage>, StoreError>;

    // ── Private chat ────────────────────────────────────────────────

    /// Fails with [`StoreError::UnknownUser`] if either party does not exist.
    async fn insert_private_message(
        &self,
        from: &str,
        to: &str,
        body: MessageBody,
    ) -> Result<PrivateMessage, StoreError>;

    /// Messages whose participants include both `a` and `b`, `updated_at`
    /// ascending, ties broken by ID.
    async fn list_conversation(&self, a: &str, b: &str) -> Result<Vec<PrivateMessage>, StoreError>;

    /// Delete every message between `a` and `b`. Returns the number removed.
    async fn delete_conversation(&self, a: &str, b: &str) -> Result<u64, StoreError>;

    /// Replace the body of a message sent by `sender_id`. `None` when the
    /// caller sent no matching message.
    async fn update_private_message(
        &self,
        sender_id: &str,
        target: Target<'_>,
        body: MessageBody,
    ) -> Result<Option<PrivateMessage>, StoreError>;
}
