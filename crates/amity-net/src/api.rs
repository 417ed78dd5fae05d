//! REST message API: history fetch and the durable write path.
//!
//! The realtime channel is only a low-latency notification layer; these two
//! calls are what actually persist and recover conversation state.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use amity_shared::{DeliveryState, Message, Peer};

use crate::error::ApiError;

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// Client-generated message id, echoed back on the realtime channel.
    pub id: Uuid,
    pub to: String,
    pub content: String,
    pub is_ai: bool,
}

impl From<&Message> for SendMessageRequest {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id,
            to: msg.to.clone(),
            content: msg.content.clone(),
            is_ai: msg.is_assistant,
        }
    }
}

/// A persisted message record as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMessage {
    /// Backend record id.
    #[serde(default)]
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    pub content: String,
    #[serde(default)]
    pub is_ai: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Convert a history row into a confirmed log entry.
    ///
    /// History rows have no client id, so each gets a fresh one; it is only
    /// used for local keying, never sent back out.
    pub fn into_message(self) -> Message {
        Message {
            id: Uuid::new_v4(),
            server_id: self.id,
            from: self.from,
            to: self.to,
            content: self.content,
            is_assistant: self.is_ai,
            created_at: self.created_at,
            delivery: DeliveryState::Confirmed,
        }
    }
}

/// The controller's seam onto the REST backend.
#[async_trait]
pub trait MessageApi {
    /// Fetch both directions of the (current user, `peer`) conversation, in
    /// the server's order.
    async fn fetch_history(&self, peer: &Peer) -> Result<Vec<StoredMessage>, ApiError>;

    /// Persist one message server-side and return the stored record.
    async fn send_persisted(&self, request: &SendMessageRequest)
        -> Result<StoredMessage, ApiError>;
}

#[async_trait]
impl<T: MessageApi + Send + Sync + ?Sized> MessageApi for Arc<T> {
    async fn fetch_history(&self, peer: &Peer) -> Result<Vec<StoredMessage>, ApiError> {
        (**self).fetch_history(peer).await
    }

    async fn send_persisted(
        &self,
        request: &SendMessageRequest,
    ) -> Result<StoredMessage, ApiError> {
        (**self).send_persisted(request).await
    }
}

/// `reqwest`-backed [`MessageApi`] implementation.
///
/// Every request carries the bearer token plus the `username` header the
/// backend reads the current user from.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    username: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str, username: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            username: username.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))
    }
}

#[async_trait]
impl MessageApi for ApiClient {
    async fn fetch_history(&self, peer: &Peer) -> Result<Vec<StoredMessage>, ApiError> {
        let url = self.endpoint(&format!("messages/{}", peer.wire_name()))?;
        debug!(peer = %peer, url = %url, "fetching conversation history");

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .header("username", &self.username)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status(),
                endpoint: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    async fn send_persisted(
        &self,
        request: &SendMessageRequest,
    ) -> Result<StoredMessage, ApiError> {
        let url = self.endpoint("messages")?;
        debug!(id = %request.id, to = %request.to, "persisting message");

        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&self.token)
            .header("username", &self.username)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status(),
                endpoint: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_wire_shape() {
        let msg = Message::outgoing("alice", &Peer::Assistant, "hello");
        let request = SendMessageRequest::from(&msg);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], "AI Assistant");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["is_ai"], true);
    }

    #[test]
    fn test_stored_message_parses_without_optional_fields() {
        let raw = r#"{
            "from": "bob",
            "to": "alice",
            "content": "hi",
            "created_at": "2026-08-20T12:00:00Z"
        }"#;
        let stored: StoredMessage = serde_json::from_str(raw).unwrap();
        assert!(stored.id.is_none());
        assert!(!stored.is_ai);

        let msg = stored.into_message();
        assert_eq!(msg.delivery, DeliveryState::Confirmed);
        assert_eq!(msg.from, "bob");
    }

    #[test]
    fn test_assistant_history_path_is_encoded() {
        let client = ApiClient::new("http://localhost:8080/api/", "token", "alice");
        let url = client
            .endpoint(&format!("messages/{}", Peer::Assistant.wire_name()))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/messages/AI%20Assistant");
    }
}
