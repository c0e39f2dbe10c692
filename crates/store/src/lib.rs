//! Key-value store core.
//! - `KvStore` is the only contract the HTTP layer depends on.
//! - `MemoryStore` guards one map with a single lock; `ShardedStore` splits
//!   keys across independently locked shards.
//! - Missing keys are `Ok(None)`, never an error.

pub mod errors;
pub mod kv_store;
pub mod memory;
pub mod sharded;
pub mod backend;

pub use backend::build_store;
pub use errors::StoreError;
pub use kv_store::{validate_key, KeySnapshot, KvStore, PutOutcome, Value};
pub use memory::MemoryStore;
pub use sharded::ShardedStore;
