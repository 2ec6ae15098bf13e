//! Profile Vault module
//!
//! Passphrase-protected, encrypted-at-rest storage for the profile list.
//!
//! - The salt is generated once per device and stored next to the blob (`profiles_salt`)
//! - The key is derived from the user's passphrase (PBKDF2-HMAC-SHA256) and never persisted
//! - The full ProfileSet is sealed with XChaCha20-Poly1305 into `profiles_encrypted`
//! - A wrong passphrase is detected by AEAD tag failure, never by inspecting plaintext

pub mod cipher;
pub mod kdf;
pub mod profile_vault;
pub mod salt;

pub use cipher::SealedBlob;
pub use kdf::{DerivedKey, Kdf, Passphrase, MIN_KDF_ITERATIONS};
pub use profile_vault::{ProfileVault, VaultOptions, VaultState};
pub use salt::{Salt, SaltStore, SALT_LEN};

use crate::prompt::PromptError;
use crate::store::StoreError;

/// Vault error
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error("Stored salt is corrupt: {0}")]
    CorruptSalt(String),

    #[error("KDF iteration count {0} is below the minimum of {min}", min = MIN_KDF_ITERATIONS)]
    WeakKdf(u32),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Authentication failed (wrong passphrase or corrupted vault)")]
    Authentication,

    #[error("Malformed vault blob: {0}")]
    MalformedBlob(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("A passphrase is required to create the profile vault")]
    PassphraseRequired,

    #[error("Vault is not unlocked (state: {0:?})")]
    Locked(VaultState),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
