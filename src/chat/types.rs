//! Assistant backend request/response shapes

use serde::{Deserialize, Serialize};

use crate::models::Profile;

/// Reply shown when the backend returns none of the known text fields
pub const NO_RESPONSE: &str = "No response received.";

/// Profile attributes attached to a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub age: String,
    pub gender: String,
    pub blood_group: String,
    pub pre_existing_conditions: String,
}

impl From<&Profile> for ProfilePayload {
    fn from(profile: &Profile) -> Self {
        Self {
            age: profile.age.clone(),
            gender: profile.sex.clone(),
            blood_group: profile.blood_group.clone(),
            pre_existing_conditions: profile.pre_cond.clone(),
        }
    }
}

/// File attached to a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime: String,
    pub content_string: String,
}

/// `POST /ask` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub message: String,
    pub mode: String,
    pub session_id: String,
    pub attachments: Vec<Attachment>,
    pub reset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfilePayload>,
}

impl AskRequest {
    /// Builds a chat request; the profile is attached only when it is not the guest.
    pub fn new(message: impl Into<String>, session_id: impl Into<String>, profile: &Profile) -> Self {
        Self {
            message: message.into(),
            mode: "chat".to_string(),
            session_id: session_id.into(),
            attachments: Vec::new(),
            reset: false,
            profile: (!profile.is_guest()).then(|| ProfilePayload::from(profile)),
        }
    }
}

/// Backend reply. Different backends fill different fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub text_response: Option<String>,
    pub message: Option<String>,
    pub response: Option<String>,
    pub error: Option<String>,
    pub confidence: Option<f64>,
    pub method: Option<String>,
}

impl AskResponse {
    /// First non-empty of `textResponse`, `message`, `response`, `error`.
    pub fn reply_text(&self) -> &str {
        [&self.text_response, &self.message, &self.response, &self.error]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(NO_RESPONSE)
    }

    /// Human-readable label for the answering method, if reported.
    pub fn method_label(&self) -> Option<&str> {
        let method = self.method.as_deref()?;
        Some(match method {
            "rag_plus_ollama" => "AI + Knowledge Base",
            "ollama_only" => "AI Reasoning",
            "rag_only" => "Knowledge Base Only",
            "fallback" => "General Advice",
            other => other,
        })
    }

    /// Confidence as a percentage string, e.g. `87.5%`.
    pub fn confidence_percent(&self) -> Option<String> {
        self.confidence.map(|c| format!("{:.1}%", c * 100.0))
    }
}
