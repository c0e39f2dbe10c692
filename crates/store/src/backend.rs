use std::sync::Arc;

use configs::{StoreBackend, StoreConfig};
use tracing::info;

use crate::kv_store::KvStore;
use crate::memory::MemoryStore;
use crate::sharded::ShardedStore;

/// Build the backend named by configuration behind the capability trait.
pub fn build_store(cfg: &StoreConfig) -> Arc<dyn KvStore> {
    match cfg.backend {
        StoreBackend::Memory => {
            info!(backend = "memory", "store initialized");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sharded => {
            let store = ShardedStore::with_shards(cfg.shards);
            info!(backend = "sharded", shards = store.shard_count(), "store initialized");
            Arc::new(store)
        }
    }
}
