//! Persistent KDF salt
//!
//! Stored as a JSON byte array under `profiles_salt`. Once written it is never
//! regenerated: a new salt would orphan every previously sealed blob.

use rand::RngCore;

use super::VaultError;
use crate::store::{KeyValueStore, SALT_KEY};

/// Salt length (128-bit)
pub const SALT_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    fn parse(raw: &str) -> Result<Self, VaultError> {
        let bytes: Vec<u8> =
            serde_json::from_str(raw).map_err(|e| VaultError::CorruptSalt(e.to_string()))?;
        let bytes: [u8; SALT_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            VaultError::CorruptSalt(format!("expected {} bytes, got {}", SALT_LEN, v.len()))
        })?;
        Ok(Self(bytes))
    }
}

/// Get-or-create access to the device salt.
pub struct SaltStore<'a, S: KeyValueStore> {
    store: &'a S,
}

impl<'a, S: KeyValueStore> SaltStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Returns the stored salt, generating and persisting one on first use.
    pub fn get_or_create(&self) -> Result<Salt, VaultError> {
        if let Some(raw) = self.store.get(SALT_KEY)? {
            return Salt::parse(&raw);
        }

        let salt = Salt::generate();
        let encoded = serde_json::to_string(&salt.0.to_vec())?;
        self.store.set(SALT_KEY, &encoded)?;
        tracing::info!("generated new profile vault salt");
        Ok(salt)
    }
}
