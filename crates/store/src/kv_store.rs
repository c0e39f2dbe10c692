use async_trait::async_trait;
use serde::Serialize;

use crate::errors::StoreError;

/// Stored payload. `serde_json::Value` already is the tagged JSON variant
/// (null, bool, number, string, array, object), so the store keeps it opaque.
pub type Value = serde_json::Value;

/// What a successful `put` did to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PutOutcome {
    Created,
    Replaced,
}

/// Key set and entry count captured at the same instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeySnapshot {
    pub keys: Vec<String>,
    pub count: usize,
}

impl KeySnapshot {
    pub fn from_keys(keys: Vec<String>) -> Self {
        let count = keys.len();
        Self { keys, count }
    }
}

/// Capability set every store backend exposes.
/// Callers hold an `Arc<dyn KvStore>` and never name the concrete backend,
/// so a sharded, bounded or persistent implementation can be swapped in.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Current value for `key`, or `None` when the key was never stored.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Create or replace the entry for `key`. Readers of the same key see
    /// either the old value or the new one, never a mix.
    async fn put(&self, key: String, value: Value) -> Result<PutOutcome, StoreError>;

    /// All keys present at one instant, in no particular order.
    async fn keys(&self) -> Vec<String>;

    /// Number of entries at call time.
    async fn count(&self) -> usize;

    /// Keys and count taken together. Backends that can capture both under
    /// the same lock acquisition override this.
    async fn snapshot(&self) -> KeySnapshot {
        KeySnapshot::from_keys(self.keys().await)
    }
}

/// Reject keys the store cannot hold. Only the empty string is malformed.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::invalid_key("key must not be empty"));
    }
    Ok(())
}
