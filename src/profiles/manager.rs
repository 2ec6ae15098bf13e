//! Profile Manager - CRUD facade and current-profile selection
//!
//! - `init()` must complete before any other operation (otherwise `NotReady`)
//! - Every mutation re-seals the full set through the vault
//! - `current()` never fails: unknown or stale selections resolve to the guest profile

use uuid::Uuid;

use crate::models::{Profile, ProfileFields, GUEST_ID};
use crate::prompt::{Prompt, PromptError};
use crate::store::KeyValueStore;
use crate::vault::{ProfileVault, VaultError, VaultState};

/// Profile Manager error
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile vault is not initialized yet")]
    NotReady,

    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Guest session: only the guest profile can be selected")]
    GuestSession,

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

pub struct ProfileManager<S, P> {
    vault: ProfileVault<S, P>,
    current_id: String,
}

impl<S: KeyValueStore, P: Prompt> ProfileManager<S, P> {
    pub fn new(vault: ProfileVault<S, P>) -> Self {
        Self {
            vault,
            current_id: GUEST_ID.to_string(),
        }
    }

    /// Unlocks the vault (or falls back to guest) and restores the last selection.
    pub async fn init(&mut self) -> Result<VaultState, ProfileError> {
        let state = self.vault.init().await?;

        self.current_id = GUEST_ID.to_string();
        if state == VaultState::Unlocked {
            if let Some(stored) = self.vault.stored_selection()? {
                if stored == GUEST_ID || self.position(&stored).is_some() {
                    self.current_id = stored;
                } else {
                    tracing::info!("stored profile selection is stale, resetting to guest");
                    self.vault.store_selection(GUEST_ID)?;
                }
            }
        }

        tracing::debug!(current = %self.current_id, ?state, "profile manager ready");
        Ok(state)
    }

    pub fn state(&self) -> VaultState {
        self.vault.state()
    }

    pub fn is_guest(&self) -> bool {
        self.vault.is_guest()
    }

    pub fn vault(&self) -> &ProfileVault<S, P> {
        &self.vault
    }

    pub fn current_id(&self) -> &str {
        &self.current_id
    }

    /// All profiles in insertion order (empty before init).
    pub fn list(&self) -> &[Profile] {
        self.vault.profiles().unwrap_or(&[])
    }

    /// Active profile, or the guest sentinel. Never fails.
    pub fn current(&self) -> Profile {
        if self.current_id == GUEST_ID {
            return Profile::guest();
        }
        self.list()
            .iter()
            .find(|p| p.id == self.current_id)
            .cloned()
            .unwrap_or_else(Profile::guest)
    }

    pub fn get(&self, id: &str) -> Result<Profile, ProfileError> {
        self.ensure_ready()?;
        self.position(id)
            .map(|idx| self.list()[idx].clone())
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))
    }

    /// Adds a profile and selects it. In guest mode it lives for this session only.
    pub async fn create(&mut self, fields: ProfileFields) -> Result<Profile, ProfileError> {
        self.ensure_ready()?;

        let mut id = Uuid::new_v4().to_string();
        while self.position(&id).is_some() {
            id = Uuid::new_v4().to_string();
        }
        let profile = Profile::from_fields(id, fields);

        let mut next = self.list().to_vec();
        next.push(profile.clone());
        self.vault.commit(next)?;

        if !self.is_guest() {
            self.select_after_commit(&profile.id);
        }

        tracing::info!(guest = self.is_guest(), "profile created");
        Ok(profile)
    }

    pub async fn update(&mut self, id: &str, fields: ProfileFields) -> Result<Profile, ProfileError> {
        self.ensure_ready()?;
        let idx = self.require(id)?;

        let mut next = self.list().to_vec();
        next[idx].apply(fields);
        let updated = next[idx].clone();
        self.vault.commit(next)?;

        tracing::info!("profile updated");
        Ok(updated)
    }

    /// Removes a profile; deleting the selected one resets selection to guest.
    pub async fn delete(&mut self, id: &str) -> Result<(), ProfileError> {
        self.ensure_ready()?;
        let idx = self.require(id)?;

        let mut next = self.list().to_vec();
        next.remove(idx);
        self.vault.commit(next)?;

        if self.current_id == id {
            self.select_after_commit(GUEST_ID);
        }

        tracing::info!("profile deleted");
        Ok(())
    }

    /// Asks the user first; returns `false` if they backed out.
    pub async fn delete_with_confirmation(&mut self, id: &str) -> Result<bool, ProfileError> {
        let profile = self.get(id)?;
        if profile.is_guest() {
            return Err(ProfileError::NotFound(id.to_string()));
        }
        if !self.vault.prompt().confirm_deletion(&profile).await? {
            return Ok(false);
        }
        self.delete(id).await?;
        Ok(true)
    }

    pub fn select(&mut self, id: &str) -> Result<(), ProfileError> {
        self.ensure_ready()?;

        if id == GUEST_ID {
            return self.set_current(GUEST_ID);
        }
        if self.is_guest() {
            return Err(ProfileError::GuestSession);
        }
        self.require(id)?;
        self.set_current(id)
    }

    fn set_current(&mut self, id: &str) -> Result<(), ProfileError> {
        self.current_id = id.to_string();
        self.vault.store_selection(id)?;
        Ok(())
    }

    /// The set is already on disk at this point; a failed selection write is
    /// repaired by the stale-selection check on the next `init`.
    fn select_after_commit(&mut self, id: &str) {
        if let Err(e) = self.set_current(id) {
            tracing::warn!("failed to persist profile selection: {}", e);
        }
    }

    fn ensure_ready(&self) -> Result<(), ProfileError> {
        if !self.vault.is_ready() {
            return Err(ProfileError::NotReady);
        }
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.list().iter().position(|p| p.id == id)
    }

    fn require(&self, id: &str) -> Result<usize, ProfileError> {
        if id == GUEST_ID {
            return Err(ProfileError::NotFound(id.to_string()));
        }
        self.position(id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))
    }
}
