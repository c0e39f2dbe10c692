use std::sync::Arc;

use store::KvStore;

/// Shared handler state. The store is injected here rather than held in a global.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}
