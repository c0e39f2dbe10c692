//! Sharded in-memory store
//!
//! Keys are spread over a fixed number of shards, each a `HashMap` behind
//! its own `RwLock`. A `put` write-locks only the shard owning the key, so
//! writers on unrelated keys do not queue behind each other.
//!
//! Enumeration (`keys`, `count`, `snapshot`) read-locks every shard in
//! ascending index order and holds all guards while reading. A writer never
//! holds more than one shard lock, so the ordered acquisition cannot
//! deadlock and the result reflects a single instant of the key set.

use std::{
    collections::{hash_map::RandomState, HashMap},
    hash::BuildHasher,
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::errors::StoreError;
use crate::kv_store::{validate_key, KeySnapshot, KvStore, PutOutcome, Value};

pub const DEFAULT_SHARDS: usize = 16;

type Shard = RwLock<HashMap<String, Value>>;

#[derive(Clone)]
pub struct ShardedStore {
    shards: Arc<[Shard]>,
    hasher: RandomState,
}

impl ShardedStore {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a store with `shards` partitions. Zero is bumped to one.
    pub fn with_shards(shards: usize) -> Self {
        let shards: Arc<[Shard]> = (0..shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_for(&self, key: &str) -> &Shard {
        let idx = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    /// Read-lock every shard, lowest index first.
    async fn read_all(&self) -> Vec<RwLockReadGuard<'_, HashMap<String, Value>>> {
        let mut guards = Vec::with_capacity(self.shards.len());
        for shard in self.shards.iter() {
            guards.push(shard.read().await);
        }
        guards
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for ShardedStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let shard = self.shard_for(key).read().await;
        Ok(shard.get(key).cloned())
    }

    async fn put(&self, key: String, value: Value) -> Result<PutOutcome, StoreError> {
        validate_key(&key)?;
        let mut shard = self.shard_for(&key).write().await;
        let outcome = match shard.insert(key, value) {
            Some(_) => PutOutcome::Replaced,
            None => PutOutcome::Created,
        };
        Ok(outcome)
    }

    async fn keys(&self) -> Vec<String> {
        self.snapshot().await.keys
    }

    async fn count(&self) -> usize {
        let guards = self.read_all().await;
        guards.iter().map(|g| g.len()).sum()
    }

    async fn snapshot(&self) -> KeySnapshot {
        let guards = self.read_all().await;
        let keys: Vec<String> = guards.iter().flat_map(|g| g.keys().cloned()).collect();
        KeySnapshot::from_keys(keys)
    }
}
