//! QHelper Error Types
//!
//! Application-wide error type and its serializable command form.

use serde::Serialize;
use thiserror::Error;

use crate::chat::ChatError;
use crate::config::ConfigError;
use crate::profiles::ProfileError;
use crate::prompt::PromptError;
use crate::store::StoreError;
use crate::vault::VaultError;

/// QHelper application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Profile(#[from] ProfileError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Serializable error for CLI output
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Store(_) => "STORAGE_UNAVAILABLE",
            AppError::Profile(ProfileError::NotReady) => "VAULT_NOT_READY",
            AppError::Profile(ProfileError::NotFound(_)) => "PROFILE_NOT_FOUND",
            AppError::Profile(ProfileError::GuestSession) => "GUEST_SESSION",
            AppError::Profile(ProfileError::Prompt(_)) => "PROMPT_ERROR",
            AppError::Profile(ProfileError::Vault(vault)) => vault_code(vault),
            AppError::Chat(ChatError::Http { .. }) => "BACKEND_HTTP_ERROR",
            AppError::Chat(_) => "BACKEND_REQUEST_FAILED",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::InvalidOperation(_) => "INVALID_OPERATION",
        };

        let details = match &error {
            AppError::Chat(ChatError::Http { body, .. }) if !body.is_empty() => Some(body.clone()),
            _ => None,
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details,
        }
    }
}

fn vault_code(error: &VaultError) -> &'static str {
    match error {
        VaultError::StorageUnavailable(_) | VaultError::CorruptSalt(_) => "STORAGE_UNAVAILABLE",
        VaultError::PassphraseRequired => "PASSPHRASE_REQUIRED",
        VaultError::Authentication => "AUTHENTICATION_FAILED",
        VaultError::Prompt(PromptError::Io(_)) => "PROMPT_ERROR",
        _ => "VAULT_ERROR",
    }
}

/// Command result type
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err: CommandError = AppError::from(ProfileError::NotFound("x".to_string())).into();
        assert_eq!(err.code, "PROFILE_NOT_FOUND");
        assert_eq!(err.message, "Profile not found: x");

        let err: CommandError =
            AppError::from(ProfileError::Vault(VaultError::PassphraseRequired)).into();
        assert_eq!(err.code, "PASSPHRASE_REQUIRED");

        let err: CommandError = AppError::from(ChatError::Http {
            status: 500,
            body: "boom".to_string(),
        })
        .into();
        assert_eq!(err.code, "BACKEND_HTTP_ERROR");
        assert_eq!(err.details.as_deref(), Some("boom"));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "BACKEND_HTTP_ERROR");
    }
}
