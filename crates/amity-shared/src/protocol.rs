//! Realtime wire protocol.
//!
//! The channel carries a single named event, `message`, as a JSON text frame
//! `{"event": "message", "data": {...}}`. The payload field names (`is_ai`,
//! `created_at`) match what the backend and the other clients expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;
use crate::types::{DeliveryState, Peer};

/// Name of the single realtime event.
pub const MESSAGE_EVENT: &str = "message";

/// Payload of a `message` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatEvent {
    /// Sender-generated message id, used for echo reconciliation.
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub content: String,
    pub is_ai: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatEvent {
    /// Whether this event belongs to the conversation between `me` and `peer`.
    pub fn involves(&self, me: &str, peer: &Peer) -> bool {
        let other = peer.wire_name();
        (self.from == me && self.to == other) || (self.from == other && self.to == me)
    }

    /// Convert an inbound event into a confirmed log entry.
    pub fn into_message(self) -> Message {
        Message {
            id: self.id,
            server_id: None,
            from: self.from,
            to: self.to,
            content: self.content,
            is_assistant: self.is_ai,
            created_at: self.created_at,
            delivery: DeliveryState::Confirmed,
        }
    }
}

impl From<&Message> for ChatEvent {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id,
            from: msg.from.clone(),
            to: msg.to.clone(),
            content: msg.content.clone(),
            is_ai: msg.is_assistant,
            created_at: msg.created_at,
        }
    }
}

/// A framed channel event as it appears on the socket.
///
/// Adjacent tagging produces the `{"event": ..., "data": ...}` shape; frames
/// with an unknown event name fail to parse and are skipped by the socket
/// task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum Frame {
    #[serde(rename = "message")]
    Message(ChatEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(from: &str, to: &str, is_ai: bool) -> ChatEvent {
        ChatEvent {
            id: Uuid::new_v4(),
            from: from.to_string(),
            to: to.to_string(),
            content: "hey".to_string(),
            is_ai,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_frame_json_shape() {
        let frame = Frame::Message(event("alice", "bob", false));
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["event"], "message");
        assert_eq!(json["data"]["from"], "alice");
        assert_eq!(json["data"]["is_ai"], false);
        assert!(json["data"]["created_at"].is_string());
    }

    #[test]
    fn test_unknown_event_rejected() {
        let raw = r#"{"event": "typing", "data": {}}"#;
        assert!(serde_json::from_str::<Frame>(raw).is_err());
    }

    #[test]
    fn test_involves_either_direction() {
        let peer = Peer::User("bob".to_string());
        assert!(event("alice", "bob", false).involves("alice", &peer));
        assert!(event("bob", "alice", false).involves("alice", &peer));
        assert!(!event("carol", "alice", false).involves("alice", &peer));
    }

    #[test]
    fn test_event_roundtrips_through_message() {
        let ev = event("bob", "alice", false);
        let msg = ev.clone().into_message();
        assert_eq!(msg.delivery, DeliveryState::Confirmed);
        assert_eq!(ChatEvent::from(&msg), ev);
    }
}
