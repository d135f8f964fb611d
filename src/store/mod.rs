//! Persistent key-value storage
//!
//! The engine keeps its daily snapshot in two keys: the practice day the
//! snapshot belongs to and the serialized task list.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the practice day (`YYYY-MM-DD`) of the saved snapshot
pub const LAST_SAVED_DATE: &str = "lastSavedDate";
/// Key holding the serialized task list
pub const SAVED_TASKS: &str = "savedTasks";

/// Errors raised by storage backends and snapshot encoding
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage i/o failed for `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize tasks: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("stored value for `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Byte store that survives process restarts.
///
/// `set` must be atomic from a reader's point of view: a concurrent `get`
/// sees either the old value or the new one.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    /// Removing an absent key succeeds
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
