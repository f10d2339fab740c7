//! natter chat service library.
//!
//! Re-exports the API router, shared state, configuration and storage so they
//! can be used by integration tests as well as the server binary.

pub mod api;
pub mod config;
pub mod db;
pub mod state;
pub mod store;
