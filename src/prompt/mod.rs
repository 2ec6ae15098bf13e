//! User interaction capabilities
//!
//! The vault never talks to a UI directly. It asks a `Prompt` for:
//! - a passphrase (new or existing), or a cancellation
//! - what to do after a wrong passphrase (retry or continue as guest)
//! - whether a profile deletion should go ahead
//!
//! `TerminalPrompt` backs the CLI; `ScriptedPrompt` replays canned answers in tests.

mod scripted;
mod terminal;

pub use scripted::ScriptedPrompt;
pub use terminal::TerminalPrompt;

use crate::models::Profile;
use crate::vault::Passphrase;

/// Prompt error
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt task failed: {0}")]
    Interrupted(String),

    #[error("Scripted prompt has no answer left for {0}")]
    Exhausted(&'static str),
}

/// Why a passphrase is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphrasePurpose {
    /// First run: choose a new passphrase
    Create,
    /// Existing vault: enter the passphrase
    Unlock,
}

/// Answer to "passphrase incorrect"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryChoice {
    Retry,
    Guest,
}

#[allow(async_fn_in_trait)]
pub trait Prompt {
    /// `Ok(None)` means the user cancelled.
    async fn prompt_passphrase(
        &self,
        purpose: PassphrasePurpose,
    ) -> Result<Option<Passphrase>, PromptError>;

    async fn confirm_retry_or_guest(&self) -> Result<RetryChoice, PromptError>;

    async fn confirm_deletion(&self, profile: &Profile) -> Result<bool, PromptError>;
}
