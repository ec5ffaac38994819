/// Redis integration for RBAC storage
///
/// This module provides the production storage backend:
/// - Connection management with automatic reconnection
/// - Per-command timeouts
/// - The key schema shared with existing deployments
///
/// # Example
///
/// ```no_run
/// use rolestore_shared::redis::client::{RedisClient, RedisConfig};
/// use rolestore_shared::store::KeyValueStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = RedisConfig::from_env()?;
/// let client = RedisClient::new(config).await?;
///
/// let healthy = client.ping().await?;
/// println!("Redis healthy: {}", healthy);
/// # Ok(())
/// # }
/// ```

pub mod client;
pub mod keys;

pub use client::{RedisClient, RedisConfig, RedisStats};
