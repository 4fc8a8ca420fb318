pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::errors::PersistenceError;

/// Durable key-value capability, scoped to this client.
/// Values are serialized documents (JSON text).
/// Send + Sync required so the store can sit behind the session mutex.
pub trait PersistenceAdapter: Send + Sync {
    /// Returns `Ok(None)` if the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}
