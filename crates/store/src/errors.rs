use thiserror::Error;

/// Failures a store backend can report.
///
/// Absence of a key is not an error: `KvStore::get` returns `Ok(None)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Reserved for bounded backends; the in-memory stores never return it.
    #[error("storage full")]
    StorageFull,
    /// Reserved for persistent backends; the in-memory stores never return it.
    #[error("io failure: {0}")]
    Io(String),
}

impl StoreError {
    pub fn invalid_key(reason: &str) -> Self {
        Self::InvalidKey(reason.to_string())
    }
}
