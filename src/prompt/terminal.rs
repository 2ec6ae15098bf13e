//! Terminal prompt (CLI)
//!
//! Passphrases are read without echo via `rpassword`. A blank passphrase means
//! "cancel". All reads happen on the blocking pool.

use std::io::{self, BufRead, Write};

use super::{PassphrasePurpose, Prompt, PromptError, RetryChoice};
use crate::models::Profile;
use crate::vault::Passphrase;

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

async fn blocking<T, F>(f: F) -> Result<T, PromptError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PromptError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PromptError::Interrupted(e.to_string()))?
}

fn read_line(question: &str) -> Result<Option<String>, PromptError> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", question)?;
    stderr.flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_lowercase()))
}

fn read_new_passphrase() -> Result<Option<Passphrase>, PromptError> {
    eprintln!("Create a passphrase to secure your profiles.");
    eprintln!("It cannot be recovered if lost. Leave blank to cancel.");
    loop {
        let first = Passphrase::new(rpassword::prompt_password("  New passphrase: ")?);
        if first.is_empty() {
            return Ok(None);
        }
        let confirm = Passphrase::new(rpassword::prompt_password("  Confirm passphrase: ")?);
        if first.expose() == confirm.expose() {
            return Ok(Some(first));
        }
        eprintln!("  Passphrases don't match, try again.");
    }
}

fn read_existing_passphrase() -> Result<Option<Passphrase>, PromptError> {
    let pass = Passphrase::new(rpassword::prompt_password(
        "Enter your profiles passphrase (blank to continue as guest): ",
    )?);
    if pass.is_empty() {
        return Ok(None);
    }
    Ok(Some(pass))
}

impl Prompt for TerminalPrompt {
    async fn prompt_passphrase(
        &self,
        purpose: PassphrasePurpose,
    ) -> Result<Option<Passphrase>, PromptError> {
        blocking(move || match purpose {
            PassphrasePurpose::Create => read_new_passphrase(),
            PassphrasePurpose::Unlock => read_existing_passphrase(),
        })
        .await
    }

    async fn confirm_retry_or_guest(&self) -> Result<RetryChoice, PromptError> {
        blocking(|| loop {
            let answer = read_line("Passphrase incorrect. [r]etry or continue as [g]uest? ")?;
            match answer.as_deref() {
                None | Some("g") | Some("guest") => return Ok(RetryChoice::Guest),
                Some("r") | Some("retry") | Some("") => return Ok(RetryChoice::Retry),
                Some(_) => continue,
            }
        })
        .await
    }

    async fn confirm_deletion(&self, profile: &Profile) -> Result<bool, PromptError> {
        let question = format!("Really delete profile '{}'? [y/N] ", profile.name);
        blocking(move || {
            let answer = read_line(&question)?;
            Ok(matches!(answer.as_deref(), Some("y") | Some("yes")))
        })
        .await
    }
}
