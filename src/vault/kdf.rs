//! Passphrase key derivation
//!
//! PBKDF2-HMAC-SHA256, 32-byte output, at least 200,000 rounds.
//! Neither the passphrase nor the derived key is ever logged or persisted.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::salt::Salt;
use super::VaultError;

/// Minimum accepted PBKDF2 round count
pub const MIN_KDF_ITERATIONS: u32 = 200_000;

/// Derived key length (256-bit)
pub const KEY_LEN: usize = 32;

/// User passphrase, wiped from memory on drop.
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for Passphrase {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// Symmetric vault key. Not `Clone`, not serializable; only the cipher reads its bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    pub(in crate::vault) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// PBKDF2 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kdf {
    iterations: u32,
}

impl Kdf {
    pub fn new(iterations: u32) -> Result<Self, VaultError> {
        if iterations < MIN_KDF_ITERATIONS {
            return Err(VaultError::WeakKdf(iterations));
        }
        Ok(Self { iterations })
    }

    /// Low round count so unit tests stay fast. Never reachable outside tests.
    #[cfg(test)]
    pub(crate) fn fast_for_tests() -> Self {
        Self { iterations: 1_000 }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Deterministic: the same (passphrase, salt) always yields the same key.
    pub fn derive(&self, passphrase: &Passphrase, salt: &Salt) -> DerivedKey {
        let mut bytes = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(
            passphrase.expose().as_bytes(),
            salt.as_bytes(),
            self.iterations,
            &mut bytes,
        );
        DerivedKey { bytes }
    }

    /// Runs `derive` on the blocking pool so the async caller is not stalled.
    pub async fn derive_async(
        &self,
        passphrase: Passphrase,
        salt: Salt,
    ) -> Result<DerivedKey, VaultError> {
        let kdf = *self;
        tokio::task::spawn_blocking(move || kdf.derive(&passphrase, &salt))
            .await
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))
    }
}

impl Default for Kdf {
    fn default() -> Self {
        Self {
            iterations: MIN_KDF_ITERATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt(byte: u8) -> Salt {
        Salt::from_bytes([byte; super::super::SALT_LEN])
    }

    #[test]
    fn test_rejects_weak_iteration_count() {
        assert!(matches!(Kdf::new(10_000), Err(VaultError::WeakKdf(10_000))));
        assert_eq!(Kdf::new(MIN_KDF_ITERATIONS).unwrap().iterations(), 200_000);
        assert_eq!(Kdf::default().iterations(), MIN_KDF_ITERATIONS);
    }

    #[test]
    fn test_derive_is_deterministic_at_full_strength() {
        let kdf = Kdf::default();
        let a = kdf.derive(&Passphrase::from("correct horse"), &salt(7));
        let b = kdf.derive(&Passphrase::from("correct horse"), &salt(7));
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_different_passphrase_or_salt_gives_different_key() {
        let kdf = Kdf::fast_for_tests();
        let base = kdf.derive(&Passphrase::from("pass1"), &salt(1));
        let other_pass = kdf.derive(&Passphrase::from("pass2"), &salt(1));
        let other_salt = kdf.derive(&Passphrase::from("pass1"), &salt(2));

        assert_ne!(base.as_bytes(), other_pass.as_bytes());
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
    }

    #[tokio::test]
    async fn test_derive_async_matches_sync() {
        let kdf = Kdf::fast_for_tests();
        let sync_key = kdf.derive(&Passphrase::from("pw"), &salt(3));
        let async_key = kdf
            .derive_async(Passphrase::from("pw"), salt(3))
            .await
            .unwrap();
        assert_eq!(sync_key.as_bytes(), async_key.as_bytes());
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let pass = Passphrase::from("hunter2");
        let key = Kdf::fast_for_tests().derive(&pass, &salt(0));
        assert!(!format!("{:?}", pass).contains("hunter2"));
        assert_eq!(format!("{:?}", key), "DerivedKey(<redacted>)");
    }
}
