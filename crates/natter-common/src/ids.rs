//! Prefixed ID generation.
//!
//! All entity IDs use a `prefix_` followed by a UUIDv7 (time-ordered), so IDs
//! sort by creation time and are identifiable by type in logs and rows.

use uuid::Uuid;

fn prefixed_id(prefix: &str) -> String {
    let id = Uuid::now_v7();
    format!("{}_{}", prefix, id.as_simple())
}

/// Generate a user ID: `usr_<uuid7>`
pub fn user_id() -> String {
    prefixed_id("usr")
}

/// Generate a group message ID: `gmsg_<uuid7>`
pub fn group_message_id() -> String {
    prefixed_id("gmsg")
}

/// Generate a private message ID: `pmsg_<uuid7>`
pub fn private_message_id() -> String {
    prefixed_id("pmsg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_correct_prefix() {
        assert!(user_id().starts_with("usr_"));
        assert!(group_message_id().starts_with("gmsg_"));
        assert!(private_message_id().starts_with("pmsg_"));
    }

    #[test]
    fn ids_are_sortable_by_time() {
        let a = private_message_id();
        let b = private_message_id();
        assert!(b > a, "Expected {b} > {a}");
    }
}
