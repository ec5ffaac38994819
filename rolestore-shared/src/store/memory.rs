/// In-memory key-value backend
///
/// Mirrors the subset of Redis semantics the RBAC layer relies on, so tests
/// and local tooling can run without a server:
///
/// - keys are typed (hash, set, sorted set) and mixing types is a `WRONGTYPE` error
/// - emptying a hash or set removes the key
/// - sorted sets order by score, then member, and `zrange` uses Redis index rules
///
/// Cloning a `MemoryStore` shares the underlying data.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{resolve_range, KeyValueStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
enum Value {
    Hash(HashMap<String, String>),
    Set(BTreeSet<String>),
    SortedSet(Vec<(String, f64)>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Hash(_) => "hash",
            Value::Set(_) => "set",
            Value::SortedSet(_) => "zset",
        }
    }
}

fn wrong_type(key: &str, found: &Value) -> StoreError {
    StoreError::Command(format!(
        "WRONGTYPE Operation against key '{}' holding a {}",
        key,
        found.type_name()
    ))
}

/// In-process store backed by a shared map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Returns true if no keys are stored
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// All live keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<bool> {
        Ok(true)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.data.read().await.contains_key(key))
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()))
        {
            Value::Hash(hash) => {
                hash.insert(field.to_string(), value.to_string());
                Ok(())
            }
            other => Err(wrong_type(key, other)),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        match self.data.read().await.get(key) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let now_empty = match data.get_mut(key) {
            None => return Ok(()),
            Some(Value::Hash(hash)) => {
                hash.remove(field);
                hash.is_empty()
            }
            Some(other) => return Err(wrong_type(key, other)),
        };
        if now_empty {
            data.remove(key);
        }
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        match self.data.read().await.get(key) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()))
        {
            Value::Set(set) => {
                set.insert(member.to_string());
                Ok(())
            }
            other => Err(wrong_type(key, other)),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let now_empty = match data.get_mut(key) {
            None => return Ok(()),
            Some(Value::Set(set)) => {
                set.remove(member);
                set.is_empty()
            }
            Some(other) => return Err(wrong_type(key, other)),
        };
        if now_empty {
            data.remove(key);
        }
        Ok(())
    }

    async fn sismember(&self, key: &str, member: &str) -> StoreResult<bool> {
        match self.data.read().await.get(key) {
            None => Ok(false),
            Some(Value::Set(set)) => Ok(set.contains(member)),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        match self.data.read().await.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Value::SortedSet(Vec::new()))
        {
            Value::SortedSet(zset) => {
                zset.retain(|(m, _)| m != member);
                zset.push((member.to_string(), score));
                zset.sort_by(|(ma, sa), (mb, sb)| sa.total_cmp(sb).then_with(|| ma.cmp(mb)));
                Ok(())
            }
            other => Err(wrong_type(key, other)),
        }
    }

    async fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        match self.data.read().await.get(key) {
            None => Ok(None),
            Some(Value::SortedSet(zset)) => Ok(zset
                .iter()
                .find(|(m, _)| m == member)
                .map(|(_, score)| *score)),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        Ok(self
            .zrange_withscores(key, start, stop)
            .await?
            .into_iter()
            .map(|(member, _)| member)
            .collect())
    }

    async fn zrange_withscores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<(String, f64)>> {
        match self.data.read().await.get(key) {
            None => Ok(Vec::new()),
            Some(Value::SortedSet(zset)) => Ok(match resolve_range(zset.len(), start, stop) {
                Some((lo, hi)) => zset[lo..=hi].to_vec(),
                None => Vec::new(),
            }),
            Some(other) => Err(wrong_type(key, other)),
        }
    }
}
