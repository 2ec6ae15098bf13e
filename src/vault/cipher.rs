//! Authenticated encryption of the vault payload
//!
//! Format (`profiles_encrypted`):
//! - `iv`: 24-byte XChaCha20-Poly1305 nonce, fresh per `seal`
//! - `data`: ciphertext with the Poly1305 tag appended
//!
//! Both are stored as JSON byte arrays: `{ "iv": [..], "data": [..] }`.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use zeroize::Zeroize;

use super::kdf::DerivedKey;
use super::VaultError;

/// Nonce length (24 bytes for XChaCha20-Poly1305)
pub const NONCE_LEN: usize = 24;

/// On-disk representation of the sealed ProfileSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBlob {
    pub iv: Vec<u8>,
    pub data: Vec<u8>,
}

impl SealedBlob {
    /// Parses a stored blob. A nonce of the wrong length (e.g. a 12-byte
    /// AES-GCM iv) is rejected here, before any key is derived.
    pub fn from_json(raw: &str) -> Result<Self, VaultError> {
        let blob: Self =
            serde_json::from_str(raw).map_err(|e| VaultError::MalformedBlob(e.to_string()))?;
        blob.check_nonce()?;
        Ok(blob)
    }

    fn check_nonce(&self) -> Result<(), VaultError> {
        if self.iv.len() != NONCE_LEN {
            return Err(VaultError::MalformedBlob(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                self.iv.len()
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, VaultError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Encrypts `plaintext` under `key` with a freshly drawn nonce.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> Result<SealedBlob, VaultError> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let data = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

    Ok(SealedBlob {
        iv: nonce.to_vec(),
        data,
    })
}

/// Decrypts and verifies `blob`. Any tag mismatch is `VaultError::Authentication`.
pub fn open(key: &DerivedKey, blob: &SealedBlob) -> Result<Vec<u8>, VaultError> {
    blob.check_nonce()?;

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(XNonce::from_slice(&blob.iv), blob.data.as_ref())
        .map_err(|_| VaultError::Authentication)
}

/// Serializes `value` as JSON and seals it.
pub fn seal_json<T: Serialize>(key: &DerivedKey, value: &T) -> Result<SealedBlob, VaultError> {
    let mut plaintext = serde_json::to_vec(value)?;
    let sealed = seal(key, &plaintext);
    plaintext.zeroize();
    sealed
}

/// Opens `blob` and parses the JSON payload.
pub fn open_json<T: DeserializeOwned>(key: &DerivedKey, blob: &SealedBlob) -> Result<T, VaultError> {
    let mut plaintext = open(key, blob)?;
    let parsed = serde_json::from_slice(&plaintext);
    plaintext.zeroize();
    Ok(parsed?)
}
