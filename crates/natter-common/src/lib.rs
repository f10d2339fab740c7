//! Shared types for the natter chat service.
//!
//! This crate contains:
//! - **Auth primitives**: HS256 JWT creation/validation, Argon2id password hashing
//! - **Data models**: users, group messages, private messages and their wire views
//! - **ID generation**: Prefixed UUIDv7 helpers (`usr_`, `gmsg_`, `pmsg_`)

pub mod auth;
pub mod ids;
pub mod models;
