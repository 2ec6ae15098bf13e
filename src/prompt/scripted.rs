//! Scripted prompt for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{PassphrasePurpose, Prompt, PromptError, RetryChoice};
use crate::models::Profile;
use crate::vault::Passphrase;

/// Replays queued answers in order. Runs dry with `PromptError::Exhausted`.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    passphrases: Mutex<VecDeque<Option<String>>>,
    retry_choices: Mutex<VecDeque<RetryChoice>>,
    deletions: Mutex<VecDeque<bool>>,
    purposes: Mutex<Vec<PassphrasePurpose>>,
    retry_calls: AtomicUsize,
    deletion_calls: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a passphrase answer.
    pub fn passphrase(self, value: &str) -> Self {
        push(&self.passphrases, Some(value.to_string()));
        self
    }

    /// Queue a cancelled passphrase prompt.
    pub fn cancel(self) -> Self {
        push(&self.passphrases, None);
        self
    }

    pub fn retry(self) -> Self {
        push(&self.retry_choices, RetryChoice::Retry);
        self
    }

    pub fn guest(self) -> Self {
        push(&self.retry_choices, RetryChoice::Guest);
        self
    }

    pub fn confirm_delete(self, answer: bool) -> Self {
        push(&self.deletions, answer);
        self
    }

    /// Purposes of every passphrase request so far.
    pub fn passphrase_requests(&self) -> Vec<PassphrasePurpose> {
        self.purposes.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn retry_calls(&self) -> usize {
        self.retry_calls.load(Ordering::SeqCst)
    }

    pub fn deletion_calls(&self) -> usize {
        self.deletion_calls.load(Ordering::SeqCst)
    }
}

fn push<T>(queue: &Mutex<VecDeque<T>>, value: T) {
    if let Ok(mut q) = queue.lock() {
        q.push_back(value);
    }
}

fn pop<T>(queue: &Mutex<VecDeque<T>>, what: &'static str) -> Result<T, PromptError> {
    queue
        .lock()
        .map_err(|e| PromptError::Interrupted(e.to_string()))?
        .pop_front()
        .ok_or(PromptError::Exhausted(what))
}

impl Prompt for ScriptedPrompt {
    async fn prompt_passphrase(
        &self,
        purpose: PassphrasePurpose,
    ) -> Result<Option<Passphrase>, PromptError> {
        if let Ok(mut purposes) = self.purposes.lock() {
            purposes.push(purpose);
        }
        Ok(pop(&self.passphrases, "passphrase")?.map(Passphrase::from))
    }

    async fn confirm_retry_or_guest(&self) -> Result<RetryChoice, PromptError> {
        self.retry_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.retry_choices, "retry-or-guest")
    }

    async fn confirm_deletion(&self, _profile: &Profile) -> Result<bool, PromptError> {
        self.deletion_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.deletions, "deletion confirmation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_runs_dry() {
        let prompt = ScriptedPrompt::new().passphrase("one").cancel().retry();

        let first = prompt
            .prompt_passphrase(PassphrasePurpose::Unlock)
            .await
            .unwrap();
        assert_eq!(first.unwrap().expose(), "one");
        assert!(prompt
            .prompt_passphrase(PassphrasePurpose::Unlock)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            prompt.prompt_passphrase(PassphrasePurpose::Create).await,
            Err(PromptError::Exhausted("passphrase"))
        ));

        assert_eq!(prompt.confirm_retry_or_guest().await.unwrap(), RetryChoice::Retry);
        assert_eq!(prompt.retry_calls(), 1);
        assert_eq!(prompt.passphrase_requests().len(), 3);
    }
}
