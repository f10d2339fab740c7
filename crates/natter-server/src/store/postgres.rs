//! PostgreSQL-backed store.
//!
//! Each trait method is a single SQL statement, so every write is atomic on
//! its own. Updates are last-writer-wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use natter_common::ids;
use natter_common::models::{GroupMessage, MessageBody, PrivateMessage, User, UserRef};

use super::{ChatStore, StoreError, Target};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type Ts = DateTime<Utc>;

/// (id, participant_id, text, created_at, updated_at, username, user_created_at)
type GroupRow = (String, String, String, Ts, Ts, String, Ts);

/// (id, participants, sender_id, text, created_at, updated_at)
type PrivateRow = (String, Vec<String>, String, String, Ts, Ts);

fn group_from_row(row: GroupRow) -> GroupMessage {
    let (id, participant_id, text, created_at, updated_at, username, user_created_at) = row;
    GroupMessage {
        id,
        message: MessageBody { text },
        participant: UserRef {
            id: participant_id,
            username,
            created_at: user_created_at,
        },
        created_at,
        updated_at,
    }
}

fn private_from_row(row: PrivateRow) -> Result<PrivateMessage, StoreError> {
    let (id, participants, sender, text, created_at, updated_at) = row;
    let participants: [String; 2] = participants.try_into().map_err(|v: Vec<String>| {
        StoreError::Database(sqlx::Error::Decode(
            format!("private message {id} has {} participants", v.len()).into(),
        ))
    })?;
    Ok(PrivateMessage {
        id,
        message: MessageBody { text },
        participants,
        sender,
        created_at,
        updated_at,
    })
}

/// Map a foreign-key violation to `UnknownUser`, anything else to `Database`.
fn unknown_user_on_fk(err: sqlx::Error, user_id: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::UnknownUser(user_id.to_owned())
        }
        _ => StoreError::Database(err),
    }
}

const GROUP_SELECT: &str = "SELECT g.id, g.participant_id, g.text, g.created_at, g.updated_at, \
     u.username, u.created_at \
     FROM group_messages g JOIN users u ON u.id = g.participant_id";

#[async_trait]
impl ChatStore for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let id = ids::user_id();
        let created_at: Ts = sqlx::query_scalar(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) RETURNING created_at",
        )
        .bind(&id)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateUsername(username.to_owned())
            }
            _ => StoreError::Database(e),
        })?;

        Ok(User {
            id,
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at,
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, Ts)>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, password_hash, created_at)| User {
            id,
            username,
            password_hash,
            created_at,
        }))
    }

    async fn insert_group_message(
        &self,
        participant_id: &str,
        body: MessageBody,
    ) -> Result<GroupMessage, StoreError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "WITH g AS ( \
                 INSERT INTO group_messages (id, participant_id, text) VALUES ($1, $2, $3) \
                 RETURNING id, participant_id, text, created_at, updated_at \
             ) \
             SELECT g.id, g.participant_id, g.text, g.created_at, g.updated_at, \
                    u.username, u.created_at \
             FROM g JOIN users u ON u.id = g.participant_id",
        )
        .bind(ids::group_message_id())
        .bind(participant_id)
        .bind(&body.text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unknown_user_on_fk(e, participant_id))?;

        Ok(group_from_row(row))
    }

    async fn list_group_messages(&self) -> Result<Vec<GroupMessage>, StoreError> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            "{GROUP_SELECT} ORDER BY g.updated_at ASC, g.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(group_from_row).collect())
    }

    async fn update_group_message(
        &self,
        owner_id: &str,
        target: Target<'_>,
        body: MessageBody,
    ) -> Result<Option<GroupMessage>, StoreError> {
        let target_id = match target {
            Target::Latest => None,
            Target::Id(id) => Some(id),
        };

        let row = sqlx::query_as::<_, GroupRow>(
            "WITH target AS ( \
                 SELECT id FROM group_messages \
                 WHERE participant_id = $1 AND ($2::TEXT IS NULL OR id = $2) \
                 ORDER BY created_at DESC, id DESC LIMIT 1 \
             ), g AS ( \
                 UPDATE group_messages m SET text = $3, updated_at = now() \
                 FROM target WHERE m.id = target.id \
                 RETURNING m.id, m.participant_id, m.text, m.created_at, m.updated_at \
             ) \
             SELECT g.id, g.participant_id, g.text, g.created_at, g.updated_at, \
                    u.username, u.created_at \
             FROM g JOIN users u ON u.id = g.participant_id",
        )
        .bind(owner_id)
        .bind(target_id)
        .bind(&body.text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(group_from_row))
    }

    async fn insert_private_message(
        &self,
        from: &str,
        to: &str,
        body: MessageBody,
    ) -> Result<PrivateMessage, StoreError> {
        // Only the sender has a foreign key; the recipient is checked inline.
        let row = sqlx::query_as::<_, PrivateRow>(
            "INSERT INTO private_messages (id, participants, sender_id, text) \
             SELECT $1, ARRAY[$2, $3]::TEXT[], $2, $4 \
             WHERE EXISTS (SELECT 1 FROM users WHERE id = $3) \
             RETURNING id, participants, sender_id, text, created_at, updated_at",
        )
        .bind(ids::private_message_id())
        .bind(from)
        .bind(to)
        .bind(&body.text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unknown_user_on_fk(e, from))?
        .ok_or_else(|| StoreError::UnknownUser(to.to_owned()))?;

        private_from_row(row)
    }

    async fn list_conversation(&self, a: &str, b: &str) -> Result<Vec<PrivateMessage>, StoreError> {
        let rows = sqlx::query_as::<_, PrivateRow>(
            "SELECT id, participants, sender_id, text, created_at, updated_at \
             FROM private_messages WHERE participants @> ARRAY[$1, $2]::TEXT[] \
             ORDER BY updated_at ASC, id ASC",
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(private_from_row).collect()
    }

    async fn delete_conversation(&self, a: &str, b: &str) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM private_messages WHERE participants @> ARRAY[$1, $2]::TEXT[]")
                .bind(a)
                .bind(b)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn update_private_message(
        &self,
        sender_id: &str,
        target: Target<'_>,
        body: MessageBody,
    ) -> Result<Option<PrivateMessage>, StoreError> {
        let target_id = match target {
            Target::Latest => None,
            Target::Id(id) => Some(id),
        };

        let row = sqlx::query_as::<_, PrivateRow>(
            "UPDATE private_messages m SET text = $3, updated_at = now() \
             FROM ( \
                 SELECT id FROM private_messages \
                 WHERE sender_id = $1 AND ($2::TEXT IS NULL OR id = $2) \
                 ORDER BY created_at DESC, id DESC LIMIT 1 \
             ) target \
             WHERE m.id = target.id \
             RETURNING m.id, m.participants, m.sender_id, m.text, m.created_at, m.updated_at",
        )
        .bind(sender_id)
        .bind(target_id)
        .bind(&body.text)
        .fetch_optional(&self.pool)
        .await?;

        row.map(private_from_row).transpose()
    }
}
