//! CLI Commands Module
//!
//! Profile and chat commands invoked from the `qhelper` binary.

pub mod ask;
pub mod profile;

use crate::config::{Config, StoreKind};
use crate::error::AppError;
use crate::profiles::ProfileManager;
use crate::prompt::Prompt;
use crate::store::{FileStore, KeyValueStore, SqliteStore};
use crate::vault::ProfileVault;

/// Store backend selected by configuration
pub type DynStore = Box<dyn KeyValueStore + Send + Sync>;

/// Opens the configured persistence backend.
pub fn open_store(config: &Config) -> Result<DynStore, AppError> {
    let store: DynStore = match config.store {
        StoreKind::Sqlite => Box::new(SqliteStore::open(&config.sqlite_path())?),
        StoreKind::File => Box::new(FileStore::open(&config.data_dir)?),
    };
    tracing::debug!(store = ?config.store, dir = %config.data_dir.display(), "opened profile store");
    Ok(store)
}

/// Builds and unlocks a profile manager (prompts for the passphrase).
pub async fn open_manager<P: Prompt>(
    config: &Config,
    prompt: P,
) -> Result<ProfileManager<DynStore, P>, AppError> {
    let store = open_store(config)?;
    let vault = ProfileVault::new(store, prompt, config.vault_options()?);
    let mut manager = ProfileManager::new(vault);
    manager.init().await?;
    Ok(manager)
}
