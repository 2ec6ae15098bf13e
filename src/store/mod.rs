//! Durable key-value storage
//!
//! The profile vault persists exactly three values:
//! - `profiles_salt`: KDF salt (JSON byte array)
//! - `profiles_encrypted`: sealed ProfileSet (`{ iv, data }`)
//! - `currentProfileId`: last selected profile id (`"guest"` or a profile id)
//!
//! Every backend must make `set` atomic: a crash during a write leaves the
//! previous value readable.

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Salt key
pub const SALT_KEY: &str = "profiles_salt";
/// Sealed profile set key
pub const BLOB_KEY: &str = "profiles_encrypted";
/// Selected profile key
pub const CURRENT_PROFILE_KEY: &str = "currentProfileId";

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence capability used by the vault.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Atomically replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}
