//! Conversation controller: the only component with business rules.
//!
//! Mediates between the presentation layer, the message store, and the
//! transport. The embedding view drives it from a single task, interleaving
//! user commands with events pulled off its channel [`Subscription`], so the
//! store is never mutated from two places at once.
//!
//! History loading and sending are split into a synchronous phase and a
//! completion phase. The async [`Controller::select_peer`] and
//! [`Controller::send_message`] compose the two; the split keeps the
//! stale-response guard and the optimistic-first ordering visible and
//! testable.

use tracing::{debug, info, warn};
use uuid::Uuid;

use amity_net::{
    ApiClient, ApiError, ChannelHandle, MessageApi, PublishEvent, SendMessageRequest,
    SocketConfig, StoredMessage,
};
use amity_shared::{ChatEvent, DeliveryState, Message, Peer};
use amity_store::Conversation;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Lifecycle of the conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// No conversation selected (or the last load failed).
    Idle,
    /// History fetch in flight.
    Loading,
    /// Messages visible; sends and inbound merges allowed.
    Ready,
}

/// Pairs an in-flight history fetch with the generation that issued it.
///
/// A response applied under a ticket whose generation is no longer current is
/// discarded, so a slow fetch for one peer can never overwrite the store
/// after the user switched to another.
#[derive(Debug)]
pub struct HistoryTicket {
    peer: Peer,
    generation: u64,
}

impl HistoryTicket {
    pub fn peer(&self) -> &Peer {
        &self.peer
    }
}

/// Orchestrates peer selection, history loading, and send/receive merging
/// for the active conversation.
///
/// The current user's identity and both transport seams are passed in by
/// construction; nothing is looked up ambiently.
pub struct Controller<A, P> {
    me: String,
    api: A,
    publisher: P,
    state: ViewState,
    generation: u64,
    conversation: Option<Conversation>,
}

impl<A: MessageApi, P: PublishEvent> Controller<A, P> {
    pub fn new(me: &str, api: A, publisher: P) -> Self {
        Self {
            me: me.to_string(),
            api,
            publisher,
            state: ViewState::Idle,
            generation: 0,
            conversation: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn current_user(&self) -> &str {
        &self.me
    }

    /// The active conversation log, if any.
    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Start switching to `peer`: clear the store, enter `Loading`, and hand
    /// back the ticket the history response must be applied under.
    pub fn begin_conversation(&mut self, peer: Peer) -> HistoryTicket {
        self.generation = self.generation.wrapping_add(1);
        self.conversation = Some(Conversation::new(peer.clone()));
        self.state = ViewState::Loading;
        info!(peer = %peer, "Loading conversation");
        HistoryTicket {
            peer,
            generation: self.generation,
        }
    }

    /// Apply a history response for a previously issued ticket.
    ///
    /// Stale tickets are discarded silently. A fetch failure returns the view
    /// to `Idle` with the error surfaced, never a stuck state.
    pub fn apply_history(
        &mut self,
        ticket: HistoryTicket,
        result: Result<Vec<StoredMessage>, ApiError>,
    ) -> Result<(), ClientError> {
        if ticket.generation != self.generation {
            debug!(peer = %ticket.peer, "Discarding stale history response");
            return Ok(());
        }

        match result {
            Ok(rows) => {
                let messages: Vec<Message> =
                    rows.into_iter().map(StoredMessage::into_message).collect();
                let Some(conv) = self.conversation.as_mut() else {
                    return Ok(());
                };
                info!(peer = %ticket.peer, count = messages.len(), "History loaded");
                conv.replace(messages);
                self.state = ViewState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!(peer = %ticket.peer, error = %e, "History fetch failed");
                self.conversation = None;
                self.state = ViewState::Idle;
                Err(ClientError::Transport(e))
            }
        }
    }

    /// Switch the active conversation to `peer` and load its history.
    pub async fn select_peer(&mut self, peer: Peer) -> Result<(), ClientError> {
        let ticket = self.begin_conversation(peer);
        let result = self.api.fetch_history(&ticket.peer).await;
        self.apply_history(ticket, result)
    }

    /// Validate, append optimistically, and publish the realtime echo.
    ///
    /// Runs before any network response: the message is visible in the log,
    /// `LocalPending`, as soon as this returns.
    pub fn prepare_send(&mut self, content: &str) -> Result<Message, ClientError> {
        if content.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        if self.state != ViewState::Ready {
            return Err(ClientError::NoConversation);
        }
        let Some(conv) = self.conversation.as_mut() else {
            return Err(ClientError::NoConversation);
        };

        let message = Message::outgoing(&self.me, conv.peer(), content);
        conv.append(message.clone());
        self.publisher.publish(ChatEvent::from(&message));
        debug!(id = %message.id, to = %message.to, "Message appended and published");
        Ok(message)
    }

    /// Record the outcome of the durable write for message `id`.
    ///
    /// On failure the message stays visible, flagged `Failed`, and the error
    /// is surfaced; it is not rolled back.
    pub fn complete_send(
        &mut self,
        id: Uuid,
        result: Result<StoredMessage, ApiError>,
    ) -> Result<(), ClientError> {
        // The view may have switched away while the write was in flight;
        // there is nothing left to update in that case.
        let Some(conv) = self.conversation.as_mut() else {
            return Ok(());
        };

        match result {
            Ok(stored) => {
                if !conv.confirm(id, stored.id) {
                    debug!(id = %id, "Durable write confirmed an already-settled message");
                }
                Ok(())
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Durable write failed");
                conv.mark_failed(id);
                Err(ClientError::SendFailed { id, source: e })
            }
        }
    }

    /// Send `content` to the active peer: optimistic append, best-effort
    /// publish, then the durable write.
    pub async fn send_message(&mut self, content: &str) -> Result<Uuid, ClientError> {
        let message = self.prepare_send(content)?;
        let request = SendMessageRequest::from(&message);
        let result = self.api.send_persisted(&request).await;
        self.complete_send(message.id, result)?;
        Ok(message.id)
    }

    /// Re-issue the durable write for a message whose send failed.
    pub async fn retry_send(&mut self, id: Uuid) -> Result<(), ClientError> {
        let request = {
            let conv = self
                .conversation
                .as_mut()
                .ok_or(ClientError::NoConversation)?;
            let message = conv.get(id).ok_or(ClientError::UnknownMessage(id))?;
            if message.delivery != DeliveryState::Failed {
                return Ok(());
            }
            let request = SendMessageRequest::from(message);
            conv.mark_pending(id);
            request
        };

        info!(id = %id, "Retrying failed send");
        let result = self.api.send_persisted(&request).await;
        self.complete_send(id, result)
    }

    /// Merge one channel-pushed event into the active conversation.
    ///
    /// Events are ignored unless the view is `Ready`, the event's
    /// sender/recipient pair matches the active (current user, peer) pair,
    /// and the assistant flag agrees with the conversation kind. The
    /// sender's own echo upgrades the pending entry in place instead of
    /// appending a duplicate.
    ///
    /// Returns whether the event changed the log.
    pub fn handle_inbound(&mut self, event: ChatEvent) -> bool {
        if self.state != ViewState::Ready {
            debug!(from = %event.from, "No ready conversation, ignoring inbound event");
            return false;
        }
        let Some(conv) = self.conversation.as_mut() else {
            return false;
        };

        if !event.involves(&self.me, conv.peer()) {
            debug!(
                from = %event.from,
                to = %event.to,
                peer = %conv.peer(),
                "Inbound event belongs to another conversation"
            );
            return false;
        }
        if event.is_ai != conv.peer().is_assistant() {
            debug!(from = %event.from, is_ai = event.is_ai, "Assistant flag mismatch, ignoring");
            return false;
        }

        if conv.confirm(event.id, None) {
            debug!(id = %event.id, "Echo reconciled against pending message");
            return true;
        }

        debug!(id = %event.id, from = %event.from, "Inbound message appended");
        conv.append(event.into_message());
        true
    }

    /// Tear the view down: drop the conversation and invalidate any in-flight
    /// history fetch. The embedding view drops its channel subscription at
    /// the same time.
    pub fn close(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.conversation = None;
        self.state = ViewState::Idle;
        info!("Conversation closed");
    }
}

impl Controller<ApiClient, ChannelHandle> {
    /// Wire up a controller against the real transport.
    ///
    /// Spawns the channel tasks, so it must run inside a tokio runtime. The
    /// returned [`ChannelHandle`] is the process-wide channel; clone it for
    /// other views and use [`ChannelHandle::subscribe`] for inbound events.
    pub fn from_config(config: &ClientConfig) -> (Self, ChannelHandle) {
        let channel = amity_net::connect(SocketConfig::new(&config.socket_url));
        let api = ApiClient::new(&config.api_url, &config.token, &config.username);
        let controller = Controller::new(&config.username, api, channel.clone());
        (controller, channel)
    }
}
