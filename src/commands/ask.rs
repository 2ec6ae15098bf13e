//! Ask Command
//!
//! Sends a first-aid question to the assistant backend on behalf of the
//! selected profile.

use serde::Serialize;

use crate::chat::{AskMode, AskRequest, ChatClient};
use crate::config::Config;
use crate::error::{AppError, CommandError, CommandResult};
use crate::profiles::ProfileManager;
use crate::prompt::Prompt;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskReply {
    pub text: String,
    pub mode: &'static str,
    pub profile_id: String,
    pub method: Option<String>,
    pub confidence: Option<String>,
}

pub async fn ask<S: KeyValueStore, P: Prompt>(
    config: &Config,
    manager: &ProfileManager<S, P>,
    message: &str,
    mode: AskMode,
) -> CommandResult<AskReply> {
    let message = message.trim();
    if message.is_empty() {
        return Err(CommandError::from(AppError::InvalidOperation(
            "Message must not be empty.".to_string(),
        )));
    }

    let profile = manager.current();
    let request = AskRequest::new(message, config.session_id.clone(), &profile);
    let client = ChatClient::new(config.backend_url.clone());

    let response = client
        .ask(&request, mode)
        .await
        .map_err(|e| CommandError::from(AppError::from(e)))?;

    Ok(AskReply {
        text: response.reply_text().to_string(),
        mode: mode.label(),
        profile_id: profile.id,
        method: response.method_label().map(str::to_string),
        confidence: response.confidence_percent(),
    })
}
