/// Key-value storage abstraction
///
/// The user store never talks to Redis directly. It goes through the
/// [`KeyValueStore`] trait, which exposes exactly the hash, set and sorted-set
/// primitives the RBAC bookkeeping needs. Two backends implement it:
///
/// - [`crate::redis::client::RedisClient`]: production backend over a
///   `redis::aio::ConnectionManager`
/// - [`memory::MemoryStore`]: in-process backend with Redis-compatible
///   semantics, used by tests and by the admin CLI's `--memory` mode
///
/// # Example
///
/// ```
/// use rolestore_shared::store::{KeyValueStore, memory::MemoryStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// store.zadd("ail:all_role", "analyst", 1.0).await?;
/// store.zadd("ail:all_role", "admin", 2.0).await?;
///
/// let roles = store.zrange("ail:all_role", 0, -1).await?;
/// assert_eq!(roles, vec!["analyst", "admin"]);
/// # Ok(())
/// # }
/// ```

pub mod memory;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Key-value store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection could not be established or was lost
    #[error("Store connection error: {0}")]
    Connection(String),

    /// Command was rejected by the store
    #[error("Store command error: {0}")]
    Command(String),

    /// Command did not complete within the configured timeout
    #[error("Store command timed out after {0}s")]
    Timeout(u64),

    /// Store configuration is invalid
    #[error("Store configuration error: {0}")]
    Config(String),
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal set of key-value primitives used by the RBAC layer
///
/// Semantics follow Redis: writing to a missing key creates it, removing the
/// last field or member of a hash or set deletes the key, and `zrange`
/// indices are inclusive with negative values counting from the end.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name for logging
    fn backend(&self) -> &'static str;

    /// Health check
    async fn ping(&self) -> StoreResult<bool>;

    /// Returns true if the key exists
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Deletes a key of any type
    async fn del(&self, key: &str) -> StoreResult<()>;

    /// Sets a hash field
    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// Reads a hash field
    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    /// Removes a hash field
    async fn hdel(&self, key: &str, field: &str) -> StoreResult<()>;

    /// Reads a whole hash (empty map if the key is missing)
    async fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// Adds a set member
    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Removes a set member
    async fn srem(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Checks set membership
    async fn sismember(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Lists set members (unordered)
    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Adds or re-scores a sorted set member
    async fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<()>;

    /// Reads a sorted set member's score
    async fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>>;

    /// Inclusive index slice of a sorted set, ascending by score
    async fn zrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// Like [`KeyValueStore::zrange`], with scores
    async fn zrange_withscores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<(String, f64)>>;
}

/// Resolves Redis `ZRANGE`-style inclusive indices against a list length
///
/// Negative indices count from the end. Out-of-range bounds are clamped.
/// Returns `None` when the resulting slice is empty.
///
/// # Example
///
/// ```
/// use rolestore_shared::store::resolve_range;
///
/// assert_eq!(resolve_range(5, 0, -1), Some((0, 4)));
/// assert_eq!(resolve_range(5, 1, 2), Some((1, 2)));
/// assert_eq!(resolve_range(5, -2, 100), Some((3, 4)));
/// assert_eq!(resolve_range(5, 3, 1), None);
/// ```
pub fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;

    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };

    if start > stop || start >= len || stop < 0 {
        return None;
    }

    Some((start as usize, stop as usize))
}
