//! Local key-value persistence
//!
//! Study state is kept under a handful of fixed keys, each holding one
//! JSON document. `FileStore` writes one file per key inside the data
//! directory; `MemoryStore` keeps everything in process.

mod file_storage;
mod memory;

use serde::Serialize;
use thiserror::Error;

pub use file_storage::FileStore;
pub use memory::MemoryStore;

/// Storage key for the question override map
pub const OVERRIDES_KEY: &str = "chd_overrides_v1";
/// Storage key for attempt statistics and quiz history
pub const PROGRESS_KEY: &str = "chd_progress_v1";
/// Storage key for the review schedule
pub const REVIEW_KEY: &str = "chd_review_v1";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// A synchronous string-valued key-value store
pub trait KeyValueStore {
    /// Read the raw value for a key, `None` if it was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write the raw value for a key, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Encode `value` as JSON and store it under `key`
pub fn save_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)?;
    store.set(key, &raw)
}

/// Keys become file names, so only a conservative character set is allowed
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
