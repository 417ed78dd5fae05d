use serde::{Deserialize, Serialize};

/// Reserved wire identity of the assistant pseudo-peer.
///
/// The backend stores assistant conversations under this literal username, so
/// a registered user with the same name would collide with it. Keeping the
/// string behind [`Peer`] confines that risk to the two wire conversion
/// functions below.
pub const ASSISTANT_WIRE_NAME: &str = "AI Assistant";

/// The other party of a two-party conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Peer {
    /// An ordinary user, addressed by username.
    User(String),
    /// The reserved AI assistant identity.
    Assistant,
}

impl Peer {
    /// Parse a wire username into a peer identity.
    pub fn from_wire_name(name: &str) -> Self {
        if name == ASSISTANT_WIRE_NAME {
            Self::Assistant
        } else {
            Self::User(name.to_string())
        }
    }

    /// The username this peer appears as in wire payloads and URLs.
    pub fn wire_name(&self) -> &str {
        match self {
            Self::User(name) => name,
            Self::Assistant => ASSISTANT_WIRE_NAME,
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant)
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Delivery state of a message in the local log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeliveryState {
    /// Appended optimistically; the durable write has not completed yet.
    LocalPending,
    /// Loaded from history, received from the channel, or upgraded in place
    /// once the durable write (or its echo) landed.
    Confirmed,
    /// The durable write failed. Still visible, flagged, retryable.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_name_parses_to_assistant() {
        assert_eq!(Peer::from_wire_name("AI Assistant"), Peer::Assistant);
        assert_eq!(
            Peer::from_wire_name("alice"),
            Peer::User("alice".to_string())
        );
    }

    #[test]
    fn test_wire_name_roundtrip() {
        let peer = Peer::User("bob".to_string());
        assert_eq!(Peer::from_wire_name(peer.wire_name()), peer);
        assert_eq!(Peer::Assistant.wire_name(), ASSISTANT_WIRE_NAME);
    }
}
