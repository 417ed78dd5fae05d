use uuid::Uuid;

use amity_shared::{DeliveryState, Message, Peer};

/// Ordered message log for one active conversation.
///
/// The controller guarantees that every message stored here belongs to the
/// (current user, peer) pair; the log itself only tracks order and delivery
/// state.
#[derive(Debug, Clone)]
pub struct Conversation {
    peer: Peer,
    messages: Vec<Message>,
}

impl Conversation {
    /// Empty log for a freshly selected peer.
    pub fn new(peer: Peer) -> Self {
        Self {
            peer,
            messages: Vec::new(),
        }
    }

    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    /// Discard the current content and install `messages` as the new log.
    ///
    /// Used when conversation history arrives. The server's order is trusted
    /// as-is, no re-sorting.
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Add a message to the end of the log.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The current ordered log, for rendering.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Upgrade a pending (or failed) entry to [`DeliveryState::Confirmed`]
    /// in place, keeping its position in the log.
    ///
    /// Returns `false` when no such entry exists, in which case the caller
    /// appends the incoming message instead. Entries that are already
    /// confirmed are not touched, so a durable-write confirmation followed
    /// by the channel echo of the same id stays a single log entry.
    pub fn confirm(&mut self, id: Uuid, server_id: Option<String>) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.delivery != DeliveryState::Confirmed)
        {
            Some(msg) => {
                msg.delivery = DeliveryState::Confirmed;
                if server_id.is_some() {
                    msg.server_id = server_id;
                }
                true
            }
            None => false,
        }
    }

    /// Flag a pending entry whose durable write failed.
    pub fn mark_failed(&mut self, id: Uuid) -> bool {
        self.set_delivery(id, DeliveryState::Failed)
    }

    /// Put a failed entry back into the pending state for a retry.
    pub fn mark_pending(&mut self, id: Uuid) -> bool {
        self.set_delivery(id, DeliveryState::LocalPending)
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn set_delivery(&mut self, id: Uuid, state: DeliveryState) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                msg.delivery = state;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn peer() -> Peer {
        Peer::User("bob".to_string())
    }

    fn confirmed(from: &str, to: &str, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            server_id: None,
            from: from.to_string(),
            to: to.to_string(),
            content: content.to_string(),
            is_assistant: false,
            created_at: Utc::now(),
            delivery: DeliveryState::Confirmed,
        }
    }

    #[test]
    fn test_append_grows_snapshot() {
        let mut conv = Conversation::new(peer());
        assert!(conv.is_empty());
        for i in 0..5 {
            conv.append(confirmed("alice", "bob", &format!("msg {i}")));
            assert_eq!(conv.len(), i + 1);
        }
    }

    #[test]
    fn test_replace_installs_exact_order() {
        let mut conv = Conversation::new(peer());
        conv.append(confirmed("alice", "bob", "stale"));

        let history = vec![
            confirmed("bob", "alice", "first"),
            confirmed("alice", "bob", "second"),
            confirmed("bob", "alice", "third"),
        ];
        conv.replace(history.clone());

        assert_eq!(conv.snapshot(), history.as_slice());
    }

    #[test]
    fn test_confirm_upgrades_in_place() {
        let mut conv = Conversation::new(peer());
        conv.append(confirmed("bob", "alice", "earlier"));
        let mut msg = confirmed("alice", "bob", "pending");
        msg.delivery = DeliveryState::LocalPending;
        let id = msg.id;
        conv.append(msg);

        assert!(conv.confirm(id, Some("srv-1".to_string())));
        let stored = &conv.snapshot()[1];
        assert_eq!(stored.delivery, DeliveryState::Confirmed);
        assert_eq!(stored.server_id.as_deref(), Some("srv-1"));
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_confirm_is_single_shot() {
        let mut conv = Conversation::new(peer());
        let mut msg = confirmed("alice", "bob", "hello");
        msg.delivery = DeliveryState::LocalPending;
        let id = msg.id;
        conv.append(msg);

        assert!(conv.confirm(id, None));
        // The echo of an already-confirmed message finds nothing to upgrade.
        assert!(!conv.confirm(id, None));
    }

    #[test]
    fn test_confirm_unknown_id_reports_miss() {
        let mut conv = Conversation::new(peer());
        assert!(!conv.confirm(Uuid::new_v4(), None));
    }

    #[test]
    fn test_failed_then_retry_flips_state() {
        let mut conv = Conversation::new(peer());
        let mut msg = confirmed("alice", "bob", "hello");
        msg.delivery = DeliveryState::LocalPending;
        let id = msg.id;
        conv.append(msg);

        assert!(conv.mark_failed(id));
        assert_eq!(conv.get(id).unwrap().delivery, DeliveryState::Failed);
        assert!(conv.mark_pending(id));
        assert_eq!(conv.get(id).unwrap().delivery, DeliveryState::LocalPending);
        assert!(conv.confirm(id, None));
    }
}
