use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DeliveryState, Peer};

/// A single chat message in the local conversation log.
///
/// Content is immutable once created; only [`Message::delivery`] (and the
/// server id learned from the durable write) change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Client-generated id. Carried on the realtime channel so the sender's
    /// own echo can be reconciled against the optimistic entry.
    pub id: Uuid,
    /// Backend record id, once the durable write has returned it.
    pub server_id: Option<String>,
    /// Sender username.
    pub from: String,
    /// Recipient username.
    pub to: String,
    pub content: String,
    /// Whether this message belongs to an assistant conversation.
    pub is_assistant: bool,
    /// Client-assigned for optimistic sends, server-assigned for history.
    pub created_at: DateTime<Utc>,
    pub delivery: DeliveryState,
}

impl Message {
    /// Build an optimistic outgoing message, timestamped now.
    pub fn outgoing(from: &str, peer: &Peer, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id: None,
            from: from.to_string(),
            to: peer.wire_name().to_string(),
            content: content.to_string(),
            is_assistant: peer.is_assistant(),
            created_at: Utc::now(),
            delivery: DeliveryState::LocalPending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_message_is_pending() {
        let msg = Message::outgoing("alice", &Peer::User("bob".to_string()), "hello");
        assert_eq!(msg.from, "alice");
        assert_eq!(msg.to, "bob");
        assert_eq!(msg.delivery, DeliveryState::LocalPending);
        assert!(!msg.is_assistant);
        assert!(msg.server_id.is_none());
    }

    #[test]
    fn test_outgoing_to_assistant_sets_flag() {
        let msg = Message::outgoing("alice", &Peer::Assistant, "hi");
        assert_eq!(msg.to, "AI Assistant");
        assert!(msg.is_assistant);
    }
}
