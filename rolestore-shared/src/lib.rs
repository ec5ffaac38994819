//! # Rolestore Shared Library
//!
//! Role-based access control over a key-value store: users, credentials,
//! bearer tokens and an ordered hierarchy of role tiers.
//!
//! ## Module Organization
//!
//! - `store`: the key-value abstraction and its in-memory backend
//! - `redis`: Redis backend, key layout and connection config
//! - `models`: user records and inputs
//! - `rbac`: role hierarchy, the user store and first-run bootstrap
//! - `auth`: password hashing, tokens and axum access guards

pub mod auth;
pub mod models;
pub mod rbac;
pub mod redis;
pub mod store;

/// Current version of the rolestore shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
