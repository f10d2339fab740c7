//! In-process store backed by concurrent maps.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use natter_common::ids;
use natter_common::models::{GroupMessage, MessageBody, PrivateMessage, User, UserRef};

use super::{ChatStore, StoreError, Target};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// username → user ID
    usernames: DashMap<String, String>,
    group: DashMap<String, GroupMessage>,
    private: DashMap<String, PrivateMessage>,
    /// Last timestamp handed out, in microseconds.
    clock: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall-clock time, forced strictly past the previous tick so ordering by
    /// `updated_at` always reflects write order.
    fn tick(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let prev = match self
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        DateTime::from_timestamp_micros(now.max(prev + 1)).unwrap_or_else(Utc::now)
    }

    fn user_ref(&self, user_id: &str) -> Result<UserRef, StoreError> {
        self.users
            .get(user_id)
            .map(|u| UserRef::from(u.value()))
            .ok_or_else(|| StoreError::UnknownUser(user_id.to_owned()))
    }
}

/// Pick the ID of the newest candidate, or the one matching `target`.
fn select_target<'a, I>(candidates: I, target: Target<'_>) -> Option<String>
where
    I: Iterator<Item = (&'a String, DateTime<Utc>)>,
{
    let mut candidates = candidates.filter(|(id, _)| match target {
        Target::Latest => true,
        Target::Id(wanted) => id.as_str() == wanted,
    });
    match target {
        Target::Id(_) => candidates.next().map(|(id, _)| id.clone()),
        Target::Latest => candidates
            .max_by(|(a_id, a_at), (b_id, b_at)| a_at.cmp(b_at).then_with(|| a_id.cmp(b_id)))
            .map(|(id, _)| id.clone()),
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        match self.usernames.entry(username.to_owned()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUsername(username.to_owned())),
            Entry::Vacant(slot) => {
                let user = User {
                    id: ids::user_id(),
                    username: username.to_owned(),
                    password_hash: password_hash.to_owned(),
                    created_at: self.tick(),
                };
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.usernames.get(username).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn insert_group_message(
        &self,
        participant_id: &str,
        body: MessageBody,
    ) -> Result<GroupMessage, StoreError> {
        let participant = self.user_ref(participant_id)?;
        let now = self.tick();
        let record = GroupMessage {
            id: ids::group_message_id(),
            message: body,
            participant,
            created_at: now,
            updated_at: now,
        };
        self.group.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn list_group_messages(&self) -> Result<Vec<GroupMessage>, StoreError> {
        let mut all: Vec<GroupMessage> = self.group.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| {
            a.updated_at
                .cmp(&b.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(all)
    }

    async fn update_group_message(
        &self,
        owner_id: &str,
        target: Target<'_>,
        body: MessageBody,
    ) -> Result<Option<GroupMessage>, StoreError> {
        let owned: Vec<(String, DateTime<Utc>)> = self
            .group
            .iter()
            .filter(|e| e.participant.id == owner_id)
            .map(|e| (e.id.clone(), e.created_at))
            .collect();
        let Some(id) = select_target(owned.iter().map(|(id, at)| (id, *at)), target) else {
            return Ok(None);
        };

        let updated_at = self.tick();
        Ok(self.group.get_mut(&id).map(|mut record| {
            record.message = body;
            record.updated_at = updated_at;
            record.clone()
        }))
    }

    async fn insert_private_message(
        &self,
        from: &str,
        to: &str,
        body: MessageBody,
    ) -> Result<PrivateMessage, StoreError> {
        self.user_ref(from)?;
        self.user_ref(to)?;
        let now = self.tick();
        let record = PrivateMessage {
            id: ids::private_message_id(),
            message: body,
            participants: [from.to_owned(), to.to_owned()],
            sender: from.to_owned(),
            created_at: now,
            updated_at: now,
        };
        self.private.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn list_conversation(&self, a: &str, b: &str) -> Result<Vec<PrivateMessage>, StoreError> {
        let mut conversation: Vec<PrivateMessage> = self
            .private
            .iter()
            .filter(|e| e.involves(a, b))
            .map(|e| e.value().clone())
            .collect();
        conversation.sort_by(|x, y| {
            x.updated_at
                .cmp(&y.updated_at)
                .then_with(|| x.id.cmp(&y.id))
        });
        Ok(conversation)
    }

    async fn delete_conversation(&self, a: &str, b: &str) -> Result<u64, StoreError> {
        let mut removed = 0u64;
        self.private.retain(|_, msg| {
            let keep = !msg.involves(a, b);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn update_private_message(
        &self,
        sender_id: &str,
        target: Target<'_>,
        body: MessageBody,
    ) -> Result<Option<PrivateMessage>, StoreError> {
        let sent: Vec<(String, DateTime<Utc>)> = self
            .private
            .iter()
            .filter(|e| e.sender == sender_id)
            .map(|e| (e.id.clone(), e.created_at))
            .collect();
        let Some(id) = select_target(sent.iter().map(|(id, at)| (id, *at)), target) else {
            return Ok(None);
        };

        let updated_at = self.tick();
        Ok(self.private.get_mut(&id).map(|mut record| {
            record.message = body;
            record.updated_at = updated_at;
            record.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(text: &str) -> MessageBody {
        MessageBody { text: text.into() }
    }

    #[tokio::test]
    async fn ticks_are_strictly_increasing() {
        let store = MemoryStore::new();
        let mut last = store.tick();
        for _ in 0..1000 {
            let next = store.tick();
            assert!(next > last);
            last = next;
        }
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let store = MemoryStore::new();
        store.create_user("alice", "hash").await.unwrap();
        assert!(matches!(
            store.create_user("alice", "hash").await,
            Err(StoreError::DuplicateUsername(_))
        ));
    }

    #[tokio::test]
    async fn group_message_requires_known_participant() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.insert_group_message("usr_ghost", body("hi")).await,
            Err(StoreError::UnknownUser(_))
        ));
        assert!(store.list_group_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn updated_group_message_moves_to_end() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();

        let first = store.insert_group_message(&alice.id, body("one")).await.unwrap();
        store.insert_group_message(&bob.id, body("two")).await.unwrap();

        let updated = store
            .update_group_message(&alice.id, Target::Id(&first.id), body("one, edited"))
            .await
            .unwrap()
            .unwrap();
        assert!(updated.updated_at > updated.created_at);

        let texts: Vec<_> = store
            .list_group_messages()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.message.text)
            .collect();
        assert_eq!(texts, ["two", "one, edited"]);
    }

    #[tokio::test]
    async fn latest_target_picks_newest_owned_message() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();

        store.insert_private_message(&alice.id, &bob.id, body("old")).await.unwrap();
        let newest = store
            .insert_private_message(&alice.id, &bob.id, body("new"))
            .await
            .unwrap();
        store.insert_private_message(&bob.id, &alice.id, body("reply")).await.unwrap();

        let updated = store
            .update_private_message(&alice.id, Target::Latest, body("new, edited"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, newest.id);
        assert_eq!(updated.message.text, "new, edited");
    }

    #[tokio::test]
    async fn update_ignores_messages_owned_by_others() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();
        let msg = store.insert_group_message(&alice.id, body("mine")).await.unwrap();

        let result = store
            .update_group_message(&bob.id, Target::Id(&msg.id), body("hijacked"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_conversation_only_touches_the_pair() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();
        let carol = store.create_user("carol", "hash").await.unwrap();

        store.insert_private_message(&alice.id, &bob.id, body("a→b")).await.unwrap();
        store.insert_private_message(&bob.id, &alice.id, body("b→a")).await.unwrap();
        store.insert_private_message(&alice.id, &carol.id, body("a→c")).await.unwrap();

        assert_eq!(store.delete_conversation(&alice.id, &bob.id).await.unwrap(), 2);
        assert_eq!(store.delete_conversation(&alice.id, &bob.id).await.unwrap(), 0);
        assert_eq!(store.list_conversation(&carol.id, &alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn delete_count_ignores_concurrent_inserts_elsewhere() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();
        let carol = store.create_user("carol", "hash").await.unwrap();

        for i in 0..50 {
            store
                .insert_private_message(&alice.id, &bob.id, body(&format!("a→b {i}")))
                .await
                .unwrap();
        }

        let writer = {
            let store = store.clone();
            let (from, to) = (carol.id.clone(), alice.id.clone());
            tokio::spawn(async move {
                for i in 0..200 {
                    store
                        .insert_private_message(&from, &to, body(&format!("c→a {i}")))
                        .await
                        .unwrap();
                }
            })
        };

        let removed = store.delete_conversation(&alice.id, &bob.id).await.unwrap();
        writer.await.unwrap();

        assert_eq!(removed, 50);
        assert_eq!(store.list_conversation(&alice.id, &carol.id).await.unwrap().len(), 200);
    }
}
