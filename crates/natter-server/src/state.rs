//! Shared application state.

use std::sync::Arc;

use natter_common::auth::JwtContext;

use crate::config::HistoryVisibility;
use crate::store::ChatStore;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn ChatStore>,
    jwt: JwtContext,
    token_ttl_secs: i64,
    history_visibility: HistoryVisibility,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ChatStore>,
        jwt: JwtContext,
        token_ttl_secs: i64,
        history_visibility: HistoryVisibility,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                jwt,
                token_ttl_secs,
                history_visibility,
            }),
        }
    }

    pub fn store(&self) -> &dyn ChatStore {
        self.inner.store.as_ref()
    }

    pub fn jwt(&self) -> &JwtContext {
        &self.inner.jwt
    }

    /// Lifetime of tokens issued at login.
    pub fn token_ttl_secs(&self) -> i64 {
        self.inner.token_ttl_secs
    }

    pub fn history_visibility(&self) -> HistoryVisibility {
        self.inner.history_visibility
    }
}
