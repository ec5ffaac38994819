#![allow(dead_code)]

//! Common test utilities for integration tests
//!
//! - In-memory user store with cheap hash parameters
//! - Per-test sentinel file locations
//! - Test user creation helpers
//! - A backend whose every command fails

use async_trait::async_trait;
use rolestore_shared::auth::password::HashParams;
use rolestore_shared::auth::token::generate_token;
use rolestore_shared::models::user::CreateUser;
use rolestore_shared::rbac::{BootstrapConfig, RoleHierarchy, UserStore};
use rolestore_shared::store::memory::MemoryStore;
use rolestore_shared::store::{KeyValueStore, StoreError, StoreResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub const PASSWORD: &str = "Integration42Pw";
pub const ADMIN: &str = "admin@admin.test";

/// Test context holding a store and a view of its raw keys
pub struct TestContext {
    pub store: UserStore,
    pub mem: MemoryStore,
    pub sentinel_path: PathBuf,
}

impl TestContext {
    /// Empty store with the five default tiers
    pub async fn new() -> Self {
        Self::with_roles(&RoleHierarchy::default_tiers()).await
    }

    /// Empty store seeded with `roles`
    pub async fn with_roles(roles: &RoleHierarchy) -> Self {
        let mem = MemoryStore::new();
        let sentinel_path = std::env::temp_dir()
            .join(format!("rolestore-test-{}", generate_token()))
            .join("DEFAULT_PASSWORD");

        let store = UserStore::new(Arc::new(mem.clone()))
            .with_hash_params(HashParams::interactive())
            .with_bootstrap(BootstrapConfig::new(ADMIN, sentinel_path.clone()));
        store.seed_roles(roles).await.expect("Failed to seed roles");

        Self {
            store,
            mem,
            sentinel_path,
        }
    }

    /// Two tiers: analyst(1) < admin(2)
    pub async fn two_tier() -> Self {
        let roles = RoleHierarchy::from_pairs([("analyst", 1), ("admin", 2)])
            .expect("Failed to build hierarchy");
        Self::with_roles(&roles).await
    }

    /// Creates a user with `role` and returns their token
    pub async fn user(&self, user_id: &str, role: &str) -> String {
        self.store
            .create(CreateUser::new(user_id, PASSWORD).with_role(role))
            .await
            .expect("Failed to create user")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(dir) = self.sentinel_path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

/// Backend that fails every command, as if Redis were unreachable
pub struct UnavailableStore;

impl UnavailableStore {
    /// User store over this backend
    pub fn user_store() -> UserStore {
        UserStore::new(Arc::new(UnavailableStore)).with_hash_params(HashParams::interactive())
    }
}

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Connection("connection refused".to_string()))
}

#[async_trait]
impl KeyValueStore for UnavailableStore {
    fn backend(&self) -> &'static str {
        "unavailable"
    }

    async fn ping(&self) -> StoreResult<bool> {
        down()
    }

    async fn exists(&self, _key: &str) -> StoreResult<bool> {
        down()
    }

    async fn del(&self, _key: &str) -> StoreResult<()> {
        down()
    }

    async fn hset(&self, _key: &str, _field: &str, _value: &str) -> StoreResult<()> {
        down()
    }

    async fn hget(&self, _key: &str, _field: &str) -> StoreResult<Option<String>> {
        down()
    }

    async fn hdel(&self, _key: &str, _field: &str) -> StoreResult<()> {
        down()
    }

    async fn hgetall(&self, _key: &str) -> StoreResult<HashMap<String, String>> {
        down()
    }

    async fn sadd(&self, _key: &str, _member: &str) -> StoreResult<()> {
        down()
    }

    async fn srem(&self, _key: &str, _member: &str) -> StoreResult<()> {
        down()
    }

    async fn sismember(&self, _key: &str, _member: &str) -> StoreResult<bool> {
        down()
    }

    async fn smembers(&self, _key: &str) -> StoreResult<Vec<String>> {
        down()
    }

    async fn zadd(&self, _key: &str, _member: &str, _score: f64) -> StoreResult<()> {
        down()
    }

    async fn zscore(&self, _key: &str, _member: &str) -> StoreResult<Option<f64>> {
        down()
    }

    async fn zrange(&self, _key: &str, _start: isize, _stop: isize) -> StoreResult<Vec<String>> {
        down()
    }

    async fn zrange_withscores(
        &self,
        _key: &str,
        _start: isize,
        _stop: isize,
    ) -> StoreResult<Vec<(String, f64)>> {
        down()
    }
}
