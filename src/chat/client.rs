//! Assistant backend HTTP client

use url::Url;

use super::types::{AskRequest, AskResponse};

/// Chat client error
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend error: {status}")]
    Http { status: u16, body: String },
}

/// Which backend pipeline answers the question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AskMode {
    /// Retrieval + LLM reasoning (`/ask`)
    #[default]
    Enhanced,
    /// Knowledge-base search only (`/ask-rag-only`)
    RagOnly,
}

impl AskMode {
    fn path(self) -> &'static str {
        match self {
            AskMode::Enhanced => "ask",
            AskMode::RagOnly => "ask-rag-only",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AskMode::Enhanced => "Enhanced AI",
            AskMode::RagOnly => "RAG Only",
        }
    }
}

pub struct ChatClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self, mode: AskMode) -> Result<Url, ChatError> {
        Ok(self.base_url.join(mode.path())?)
    }

    /// Posts a question and returns the parsed reply.
    pub async fn ask(&self, request: &AskRequest, mode: AskMode) -> Result<AskResponse, ChatError> {
        let url = self.endpoint(mode)?;
        tracing::debug!(%url, with_profile = request.profile.is_some(), "sending question");

        let resp = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "assistant backend returned an error");
            return Err(ChatError::Http { status, body });
        }

        Ok(resp.json::<AskResponse>().await?)
    }
}

/// `Url::join` drops the last path segment unless it ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use mockito::Matcher;

    #[test]
    fn test_endpoints_respect_base_path() {
        let client = ChatClient::new(Url::parse("http://localhost:8000/api").unwrap());
        assert_eq!(
            client.endpoint(AskMode::Enhanced).unwrap().as_str(),
            "http://localhost:8000/api/ask"
        );
        assert_eq!(
            client.endpoint(AskMode::RagOnly).unwrap().as_str(),
            "http://localhost:8000/api/ask-rag-only"
        );
    }

    #[tokio::test]
    async fn test_ask_posts_payload_and_parses_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ask")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "message": "burn",
                "mode": "chat",
                "sessionId": "s1"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"textResponse":"Cool under running water","method":"rag_plus_ollama"}"#)
            .create_async()
            .await;

        let client = ChatClient::new(Url::parse(&server.url()).unwrap());
        let req = AskRequest::new("burn", "s1", &Profile::guest());
        let reply = client.ask(&req, AskMode::Enhanced).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.reply_text(), "Cool under running water");
        assert_eq!(reply.method_label(), Some("AI + Knowledge Base"));
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/ask-rag-only")
            .with_status(502)
            .with_body("upstream down")
            .create_async()
            .await;

        let client = ChatClient::new(Url::parse(&server.url()).unwrap());
        let req = AskRequest::new("cut", "s1", &Profile::guest());
        let err = client.ask(&req, AskMode::RagOnly).await.unwrap_err();

        assert!(matches!(err, ChatError::Http { status: 502, ref body } if body == "upstream down"));
    }
}
