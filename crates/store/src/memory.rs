use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::kv_store::{validate_key, KeySnapshot, KvStore, PutOutcome, Value};

/// In-memory key-value map behind a single read/write lock.
///
/// Readers proceed in parallel; a writer excludes everyone for the length of
/// one insert. Every enumeration runs under one read guard, so `keys`,
/// `count` and `snapshot` always agree with each other.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let map = self.inner.read().await;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: String, value: Value) -> Result<PutOutcome, StoreError> {
        validate_key(&key)?;
        let mut map = self.inner.write().await;
        let outcome = match map.insert(key, value) {
            Some(_) => PutOutcome::Replaced,
            None => PutOutcome::Created,
        };
        Ok(outcome)
    }

    async fn keys(&self) -> Vec<String> {
        let map = self.inner.read().await;
        map.keys().cloned().collect()
    }

    async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    async fn snapshot(&self) -> KeySnapshot {
        let map = self.inner.read().await;
        KeySnapshot { keys: map.keys().cloned().collect(), count: map.len() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_basic_crud() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();

        // initially empty
        assert_eq!(store.count().await, 0);
        assert!(store.keys().await.is_empty());

        assert_eq!(store.put("a".into(), json!(1)).await?, PutOutcome::Created);
        assert_eq!(store.put("b".into(), json!({"x": [1, 2]})).await?, PutOutcome::Created);
        assert_eq!(store.put("a".into(), json!(null)).await?, PutOutcome::Replaced);

        assert_eq!(store.get("a").await?, Some(json!(null)));
        assert_eq!(store.get("b").await?, Some(json!({"x": [1, 2]})));
        assert_eq!(store.get("missing").await?, None);
        assert_eq!(store.count().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_rejects_empty_key_without_mutation() {
        let store = MemoryStore::new();
        let err = store.put(String::new(), json!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
        assert!(matches!(store.get("").await, Err(StoreError::InvalidKey(_))));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn clones_share_the_same_map() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let other = store.clone();
        other.put("k".into(), json!("v")).await?;
        assert_eq!(store.get("k").await?, Some(json!("v")));
        Ok(())
    }
}
