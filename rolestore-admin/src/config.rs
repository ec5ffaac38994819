/// Configuration management for the admin CLI
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection string (required unless `--memory`)
/// - `REDIS_CONNECTION_TIMEOUT_SECS`, `REDIS_COMMAND_TIMEOUT_SECS`, `REDIS_MAX_RETRIES`
/// - `ROLESTORE_ADMIN_USER`: first-run administrator (default: admin@admin.test)
/// - `ROLESTORE_HOME`: deployment directory holding the sentinel file (default: .)
/// - `ROLESTORE_SENTINEL_FILE`: explicit sentinel path
/// - `PASSWORD_HASH_MEMORY_KIB`, `PASSWORD_HASH_ITERATIONS`, `PASSWORD_HASH_PARALLELISM`
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use rolestore_admin::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env(false)?;
/// println!("Administrator: {}", config.bootstrap.admin_user);
/// # Ok(())
/// # }
/// ```

use rolestore_shared::auth::password::HashParams;
use rolestore_shared::rbac::BootstrapConfig;
use rolestore_shared::redis::RedisConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend
    pub backend: BackendConfig,

    /// First-run administrator and sentinel file
    pub bootstrap: BootstrapConfig,

    /// Argon2 cost for new password hashes
    pub hash: HashParams,
}

/// Storage backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Redis server
    Redis(RedisConfig),

    /// Process-local store, discarded on exit
    Memory,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// With `memory` set, no Redis settings are read.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `REDIS_URL` is missing and `memory` is false
    /// - A numeric variable does not parse
    pub fn from_env(memory: bool) -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let backend = if memory {
            BackendConfig::Memory
        } else {
            BackendConfig::Redis(RedisConfig::from_env()?)
        };

        let defaults = HashParams::default();
        let hash = HashParams {
            memory_kib: parse_var("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_var("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_var("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            backend,
            bootstrap: BootstrapConfig::from_env(),
            hash,
        })
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.backend, BackendConfig::Memory)
    }
}

/// Reads `name` as a `T`, falling back to `default` when unset
fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        let parsed: u32 = parse_value("PASSWORD_HASH_ITERATIONS", " 4 ").unwrap();
        assert_eq!(parsed, 4);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        let err = parse_value::<u32>("PASSWORD_HASH_ITERATIONS", "many").unwrap_err();
        assert!(err.to_string().contains("PASSWORD_HASH_ITERATIONS"));
    }

    #[test]
    fn test_parse_var_default_when_unset() {
        let value: u32 = parse_var("ROLESTORE_TEST_SURELY_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_is_memory() {
        let config = Config {
            backend: BackendConfig::Memory,
            bootstrap: BootstrapConfig::new("a@x.io", "/tmp/DEFAULT_PASSWORD"),
            hash: HashParams::interactive(),
        };
        assert!(config.is_memory());

        let config = Config {
            backend: BackendConfig::Redis(RedisConfig::with_url("redis://localhost:6379")),
            ..config
        };
        assert!(!config.is_memory());
    }
}
