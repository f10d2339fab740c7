//! Ownership checks run after authentication and before any store call.

use super::auth_extractor::AuthUser;
use super::error::ApiError;

/// The caller must be the identity the request claims to act as.
pub fn require_owner(user: &AuthUser, claimed_owner: &str) -> Result<(), ApiError> {
    if user.user_id == claimed_owner {
        return Ok(());
    }
    tracing::warn!(
        user_id = %user.user_id,
        claimed_owner = %claimed_owner,
        "caller does not own the resource"
    );
    Err(ApiError::unauthorized("caller does not own this resource"))
}

/// The caller must be one side of the `a`/`b` conversation.
pub fn require_participant(user: &AuthUser, a: &str, b: &str) -> Result<(), ApiError> {
    if user.user_id == a || user.user_id == b {
        return Ok(());
    }
    tracing::warn!(user_id = %user.user_id, "caller is not part of the conversation");
    Err(ApiError::unauthorized("caller is not part of this conversation"))
}
