//! Profile Vault - unlock state machine and encrypted persistence
//!
//! ```text
//! Uninitialized ──init()──┬─ no blob ──> Creating ──passphrase──> Unlocked
//!                         │                  └─ declined ──> PassphraseRequired (error)
//!                         └─ blob ─────> Unlocking ──correct──> Unlocked
//!                                            ├─ cancelled ──────> Guest
//!                                            └─ wrong ── retry? ─┬─ retry ─> Unlocking
//!                                                                └─ guest ─> Guest
//! ```
//!
//! - `Unlocked` and `Guest` are terminal for the session
//! - The derived key and decrypted profiles only ever live in memory
//! - Every write re-seals the entire ProfileSet (no partial updates)
//! - In `Guest`, writes are no-ops: guest data disappears with the session

use crate::models::{Profile, GUEST_ID};
use crate::prompt::{PassphrasePurpose, Prompt, RetryChoice};
use crate::store::{KeyValueStore, BLOB_KEY, CURRENT_PROFILE_KEY};

use super::cipher::{self, SealedBlob};
use super::kdf::{DerivedKey, Kdf};
use super::salt::{Salt, SaltStore};
use super::VaultError;

/// Unlock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Uninitialized,
    Creating,
    Unlocking,
    Unlocked,
    Guest,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VaultOptions {
    pub kdf: Kdf,
    /// Wrong-passphrase attempts before falling back to guest. `None` = unlimited.
    pub max_unlock_attempts: Option<u32>,
}

/// Encrypted profile container
pub struct ProfileVault<S, P> {
    store: S,
    prompt: P,
    options: VaultOptions,
    state: VaultState,
    /// Held only while `Unlocked`; zeroized on drop
    key: Option<DerivedKey>,
    profiles: Vec<Profile>,
}

impl<S: KeyValueStore, P: Prompt> ProfileVault<S, P> {
    pub fn new(store: S, prompt: P, options: VaultOptions) -> Self {
        Self {
            store,
            prompt,
            options,
            state: VaultState::Uninitialized,
            key: None,
            profiles: Vec::new(),
        }
    }

    pub fn state(&self) -> VaultState {
        self.state
    }

    /// `true` once the vault reached `Unlocked` or `Guest`.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, VaultState::Unlocked | VaultState::Guest)
    }

    pub fn is_guest(&self) -> bool {
        self.state == VaultState::Guest
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Current ProfileSet in insertion order.
    pub fn profiles(&self) -> Result<&[Profile], VaultError> {
        if !self.is_ready() {
            return Err(VaultError::Locked(self.state));
        }
        Ok(&self.profiles)
    }

    /// Runs the unlock sequence. A no-op once `Unlocked` or `Guest`.
    ///
    /// On error the vault falls back to `Uninitialized` with no key held.
    pub async fn init(&mut self) -> Result<VaultState, VaultError> {
        if self.is_ready() {
            return Ok(self.state);
        }

        match self.run_init().await {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::error!("profile vault initialization failed: {}", e);
                self.state = VaultState::Uninitialized;
                self.key = None;
                self.profiles.clear();
                Err(e)
            }
        }
    }

    async fn run_init(&mut self) -> Result<VaultState, VaultError> {
        let salt = SaltStore::new(&self.store).get_or_create()?;

        match self.store.get(BLOB_KEY)? {
            None => self.create(salt).await,
            Some(raw) => self.unlock(salt, &raw).await,
        }
    }

    async fn create(&mut self, salt: Salt) -> Result<VaultState, VaultError> {
        self.state = VaultState::Creating;
        tracing::info!("no profile vault found, creating a new one");

        let passphrase = self
            .prompt
            .prompt_passphrase(PassphrasePurpose::Create)
            .await?
            .ok_or(VaultError::PassphraseRequired)?;

        let key = self.options.kdf.derive_async(passphrase, salt).await?;

        // Seal the empty set right away so the chosen passphrase is binding.
        self.profiles.clear();
        self.key = Some(key);
        self.state = VaultState::Unlocked;
        self.write(&[])?;

        tracing::info!("profile vault created");
        Ok(self.state)
    }

    async fn unlock(&mut self, salt: Salt, raw: &str) -> Result<VaultState, VaultError> {
        self.state = VaultState::Unlocking;

        // An unparseable or malformed blob cannot be opened by any passphrase;
        // treat it like a failed tag check so the user can still continue as guest.
        let blob = match SealedBlob::from_json(raw) {
            Ok(blob) => Some(blob),
            Err(e) => {
                tracing::warn!("stored profile vault is unreadable: {}", e);
                None
            }
        };

        let mut attempts: u32 = 0;
        loop {
            let Some(passphrase) = self
                .prompt
                .prompt_passphrase(PassphrasePurpose::Unlock)
                .await?
            else {
                tracing::info!("passphrase prompt cancelled");
                return Ok(self.enter_guest());
            };

            let key = self.options.kdf.derive_async(passphrase, salt).await?;
            let opened = match &blob {
                Some(blob) => cipher::open_json::<Vec<Profile>>(&key, blob),
                None => Err(VaultError::Authentication),
            };

            match opened {
                Ok(profiles) => {
                    tracing::info!(profiles = profiles.len(), "profile vault unlocked");
                    self.profiles = profiles;
                    self.key = Some(key);
                    self.state = VaultState::Unlocked;
                    return Ok(self.state);
                }
                Err(VaultError::Authentication)
                | Err(VaultError::MalformedBlob(_))
                | Err(VaultError::Serialization(_)) => {
                    attempts += 1;
                    tracing::warn!(attempts, "profile vault unlock failed");

                    if self
                        .options
                        .max_unlock_attempts
                        .is_some_and(|max| attempts >= max)
                    {
                        tracing::warn!("unlock attempt limit reached");
                        return Ok(self.enter_guest());
                    }

                    match self.prompt.confirm_retry_or_guest().await? {
                        RetryChoice::Retry => continue,
                        RetryChoice::Guest => return Ok(self.enter_guest()),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn enter_guest(&mut self) -> VaultState {
        self.profiles.clear();
        self.key = None;
        self.state = VaultState::Guest;
        tracing::info!("continuing as guest; profile changes will not be saved");
        self.state
    }

    /// Re-seals the current ProfileSet. No-op in `Guest`.
    pub fn save(&self) -> Result<(), VaultError> {
        match self.state {
            VaultState::Unlocked => self.write(&self.profiles),
            VaultState::Guest => {
                tracing::debug!("guest session, skipping vault write");
                Ok(())
            }
            state => Err(VaultError::Locked(state)),
        }
    }

    /// Replaces the ProfileSet. The candidate is persisted first; memory is
    /// only updated once the write succeeded.
    pub fn commit(&mut self, profiles: Vec<Profile>) -> Result<(), VaultError> {
        match self.state {
            VaultState::Unlocked => {
                self.write(&profiles)?;
                self.profiles = profiles;
                Ok(())
            }
            VaultState::Guest => {
                self.profiles = profiles;
                Ok(())
            }
            state => Err(VaultError::Locked(state)),
        }
    }

    fn write(&self, profiles: &[Profile]) -> Result<(), VaultError> {
        let key = self.key.as_ref().ok_or(VaultError::Locked(self.state))?;
        let blob = cipher::seal_json(key, &profiles)?;
        self.store.set(BLOB_KEY, &blob.to_json()?)?;
        tracing::debug!(profiles = profiles.len(), "profile vault saved");
        Ok(())
    }

    /// Last persisted selection (`currentProfileId`), if any.
    pub fn stored_selection(&self) -> Result<Option<String>, VaultError> {
        if self.is_guest() {
            return Ok(None);
        }
        Ok(self.store.get(CURRENT_PROFILE_KEY)?)
    }

    /// Persists the selection. Guest sessions never write.
    pub fn store_selection(&self, id: &str) -> Result<(), VaultError> {
        match self.state {
            VaultState::Unlocked => {
                self.store.set(CURRENT_PROFILE_KEY, id)?;
                Ok(())
            }
            VaultState::Guest => {
                debug_assert_eq!(id, GUEST_ID);
                Ok(())
            }
            state => Err(VaultError::Locked(state)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use crate::prompt::ScriptedPrompt;
    use crate::store::{MemoryStore, SALT_KEY};

    fn options() -> VaultOptions {
        VaultOptions {
            kdf: Kdf::fast_for_tests(),
            max_unlock_attempts: None,
        }
    }

    fn profile(id: &str, name: &str) -> Profile {
        Profile {
            id: id.to_string(),
            name: name.to_string(),
            age: "30".to_string(),
            sex: "F".to_string(),
            blood_group: "A+".to_string(),
            pre_cond: "none".to_string(),
        }
    }

    /// Creates a vault under "secret" holding `profiles`.
    async fn seeded_store(profiles: Vec<Profile>) -> MemoryStore {
        let store = MemoryStore::new();
        {
            let mut vault =
                ProfileVault::new(&store, ScriptedPrompt::new().passphrase("secret"), options());
            vault.init().await.unwrap();
            vault.commit(profiles).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_fresh_device_creates_salt_and_unlocks_empty() {
        let store = MemoryStore::new();
        let mut vault =
            ProfileVault::new(&store, ScriptedPrompt::new().passphrase("secret"), options());

        assert_eq!(vault.state(), VaultState::Uninitialized);
        assert_eq!(vault.init().await.unwrap(), VaultState::Unlocked);

        assert!(vault.profiles().unwrap().is_empty());
        assert!(store.raw(SALT_KEY).is_some());
        assert!(store.raw(BLOB_KEY).is_some());
        assert_eq!(
            vault.prompt().passphrase_requests(),
            vec![PassphrasePurpose::Create]
        );
    }

    #[tokio::test]
    async fn test_fresh_device_decline_requires_passphrase() {
        let store = MemoryStore::new();
        let mut vault = ProfileVault::new(&store, ScriptedPrompt::new().cancel(), options());

        let err = vault.init().await.unwrap_err();
        assert!(matches!(err, VaultError::PassphraseRequired));
        assert_eq!(vault.state(), VaultState::Uninitialized);
        assert!(store.raw(BLOB_KEY).is_none());
        assert!(vault.profiles().is_err());
    }

    #[tokio::test]
    async fn test_existing_blob_correct_passphrase_restores_set() {
        let saved = vec![profile("1", "Ana"), profile("2", "Ben")];
        let store = seeded_store(saved.clone()).await;

        let mut vault =
            ProfileVault::new(&store, ScriptedPrompt::new().passphrase("secret"), options());
        assert_eq!(vault.init().await.unwrap(), VaultState::Unlocked);
        assert_eq!(vault.profiles().unwrap(), saved.as_slice());
        assert_eq!(vault.prompt().retry_calls(), 0);
    }

    #[tokio::test]
    async fn test_two_wrong_passphrases_then_guest_leaves_blob_untouched() {
        let store = seeded_store(vec![profile("1", "Ana")]).await;
        let blob_before = store.raw(BLOB_KEY);
        let writes_before = store.write_count();

        let prompt = ScriptedPrompt::new()
            .passphrase("wrong-1")
            .retry()
            .passphrase("wrong-2")
            .guest();
        let mut vault = ProfileVault::new(&store, prompt, options());

        assert_eq!(vault.init().await.unwrap(), VaultState::Guest);
        assert!(vault.profiles().unwrap().is_empty());
        assert_eq!(vault.prompt().retry_calls(), 2);
        assert_eq!(store.raw(BLOB_KEY), blob_before);

        vault.save().unwrap();
        assert_eq!(store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn test_retry_then_correct_passphrase_unlocks() {
        let store = seeded_store(vec![profile("1", "Ana")]).await;
        let prompt = ScriptedPrompt::new()
            .passphrase("nope")
            .retry()
            .passphrase("secret");
        let mut vault = ProfileVault::new(&store, prompt, options());

        assert_eq!(vault.init().await.unwrap(), VaultState::Unlocked);
        assert_eq!(vault.profiles().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_on_unlock_enters_guest_without_writes() {
        let store = seeded_store(vec![profile("1", "Ana")]).await;
        let writes_before = store.write_count();

        let mut vault = ProfileVault::new(&store, ScriptedPrompt::new().cancel(), options());
        assert_eq!(vault.init().await.unwrap(), VaultState::Guest);

        vault.commit(vec![profile("tmp", "Session only")]).unwrap();
        vault.save().unwrap();
        vault.store_selection(GUEST_ID).unwrap();

        assert_eq!(store.write_count(), writes_before);
        assert_eq!(vault.profiles().unwrap().len(), 1);
        assert_eq!(vault.stored_selection().unwrap(), None);
    }

    #[tokio::test]
    async fn test_attempt_cap_falls_back_to_guest() {
        let store = seeded_store(vec![]).await;
        let prompt = ScriptedPrompt::new().passphrase("a").retry().passphrase("b");
        let mut vault = ProfileVault::new(
            &store,
            prompt,
            VaultOptions {
                kdf: Kdf::fast_for_tests(),
                max_unlock_attempts: Some(2),
            },
        );

        assert_eq!(vault.init().await.unwrap(), VaultState::Guest);
        assert_eq!(vault.prompt().retry_calls(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_blob_is_recoverable_as_guest() {
        let store = seeded_store(vec![]).await;
        store.set(BLOB_KEY, "{garbage").unwrap();

        let prompt = ScriptedPrompt::new().passphrase("secret").guest();
        let mut vault = ProfileVault::new(&store, prompt, options());

        assert_eq!(vault.init().await.unwrap(), VaultState::Guest);
        assert_eq!(store.raw(BLOB_KEY).as_deref(), Some("{garbage"));
    }

    #[tokio::test]
    async fn test_short_nonce_blob_offers_retry_or_guest() {
        let store = seeded_store(vec![]).await;
        let aes_gcm_shaped = serde_json::json!({
            "iv": (1..=12).collect::<Vec<u8>>(),
            "data": (1..=17).collect::<Vec<u8>>(),
        });
        store.set(BLOB_KEY, &aes_gcm_shaped.to_string()).unwrap();

        let prompt = ScriptedPrompt::new().passphrase("secret").guest();
        let mut vault = ProfileVault::new(&store, prompt, options());

        assert_eq!(vault.init().await.unwrap(), VaultState::Guest);
        assert_eq!(vault.prompt().retry_calls(), 1);
        assert!(vault.profiles().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_operations_before_init_are_rejected() {
        let store = MemoryStore::new();
        let mut vault = ProfileVault::new(&store, ScriptedPrompt::new(), options());

        assert!(matches!(
            vault.save(),
            Err(VaultError::Locked(VaultState::Uninitialized))
        ));
        assert!(vault.commit(vec![]).is_err());
        assert!(vault.store_selection("x").is_err());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_set() {
        let store = MemoryStore::new();
        let mut vault =
            ProfileVault::new(&store, ScriptedPrompt::new().passphrase("secret"), options());
        vault.init().await.unwrap();
        vault.commit(vec![profile("1", "Ana")]).unwrap();
        let blob_before = store.raw(BLOB_KEY);

        store.set_read_only(true);
        let err = vault
            .commit(vec![profile("1", "Ana"), profile("2", "Ben")])
            .unwrap_err();

        assert!(matches!(err, VaultError::StorageUnavailable(_)));
        assert_eq!(vault.profiles().unwrap().len(), 1);
        assert_eq!(store.raw(BLOB_KEY), blob_before);
    }

    #[tokio::test]
    async fn test_unavailable_storage_is_fatal() {
        let store = MemoryStore::unavailable();
        let mut vault =
            ProfileVault::new(&store, ScriptedPrompt::new().passphrase("x"), options());

        assert!(matches!(
            vault.init().await,
            Err(VaultError::StorageUnavailable(_))
        ));
        assert!(vault.prompt().passphrase_requests().is_empty());
    }

    #[tokio::test]
    async fn test_init_is_idempotent_once_ready() {
        let store = MemoryStore::new();
        let mut vault =
            ProfileVault::new(&store, ScriptedPrompt::new().passphrase("secret"), options());
        vault.init().await.unwrap();

        // Script is empty now; a second prompt would fail.
        assert_eq!(vault.init().await.unwrap(), VaultState::Unlocked);
        assert_eq!(vault.prompt().passphrase_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_saved_set_reopens_with_each_save_using_new_nonce() {
        let store = MemoryStore::new();
        let mut vault =
            ProfileVault::new(&store, ScriptedPrompt::new().passphrase("secret"), options());
        vault.init().await.unwrap();

        vault.save().unwrap();
        let first = SealedBlob::from_json(&store.raw(BLOB_KEY).unwrap()).unwrap();
        vault.save().unwrap();
        let second = SealedBlob::from_json(&store.raw(BLOB_KEY).unwrap()).unwrap();

        assert_ne!(first.iv, second.iv);
    }
}
