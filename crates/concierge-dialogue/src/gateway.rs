//! Client for the remote text-generation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use concierge_core::{Language, SessionId, SourceRef};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// A successful answer from the remote responder.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteReply {
    pub response: String,
    pub sources: Vec<SourceRef>,
}

/// Answers free text that no local rule matched.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn ask(
        &self,
        text: &str,
        language: Language,
        session_id: &SessionId,
    ) -> Result<RemoteReply, GatewayError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    language: Language,
    user_id: &'a SessionId,
}

#[derive(Deserialize)]
struct ChatResponse {
    status: String,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    sources: Vec<SourceRef>,
}

/// `POST {base}/chat` with `{message, language, user_id}`.
pub struct HttpResponder {
    client: reqwest::Client,
    chat_url: String,
}

impl HttpResponder {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            chat_url: format!("{}/chat", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn ask(
        &self,
        text: &str,
        language: Language,
        session_id: &SessionId,
    ) -> Result<RemoteReply, GatewayError> {
        let body = ChatRequest {
            message: text,
            language,
            user_id: session_id,
        };

        let response = self.client.post(&self.chat_url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let raw = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| GatewayError::Decode(e.to_string()))?;

        if parsed.status != "success" {
            return Err(GatewayError::Rejected(parsed.status));
        }

        let response = parsed
            .response
            .ok_or_else(|| GatewayError::Decode("missing response field".to_string()))?;

        tracing::debug!(
            session_id = %session_id,
            sources = parsed.sources.len(),
            "Remote responder answered"
        );

        Ok(RemoteReply {
            response,
            sources: parsed.sources,
        })
    }
}

/// Used when no backend is configured. Every question fails with
/// [`GatewayError::NotConfigured`], which the engine reports as an apology.
pub struct OfflineResponder;

#[async_trait]
impl Responder for OfflineResponder {
    async fn ask(
        &self,
        _text: &str,
        _language: Language,
        _session_id: &SessionId,
    ) -> Result<RemoteReply, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let id = SessionId("user_7".to_string());
        let body = ChatRequest {
            message: "where can I park",
            language: Language::En,
            user_id: &id,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "where can I park");
        assert_eq!(json["language"], "en");
        assert_eq!(json["user_id"], "user_7");
    }

    #[test]
    fn test_chat_url_joins_base() {
        let responder = HttpResponder::with_client(reqwest::Client::new(), "http://localhost:5000/");
        assert_eq!(responder.chat_url, "http://localhost:5000/chat");
    }

    #[tokio::test]
    async fn test_offline_responder() {
        let result = OfflineResponder
            .ask("hello world again", Language::Vi, &SessionId::new())
            .await;
        assert!(matches!(result, Err(GatewayError::NotConfigured)));
    }
}
