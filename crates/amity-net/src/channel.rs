//! Process-wide realtime channel router.
//!
//! One router task is spawned per process and shared by every conversation
//! view. External code talks to it through a typed command channel, mirroring
//! the single shared socket on the other side: at most one inbound
//! subscription is live at a time, and publishing is fire-and-forget.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use amity_shared::ChatEvent;

use crate::error::ChannelError;

/// Commands sent *into* the router task.
#[derive(Debug)]
pub enum ChannelCommand {
    /// Emit an event on the wire for all other connected clients.
    Publish(ChatEvent),
    /// Install `tx` as the inbound subscriber, replacing any previous one.
    Subscribe {
        id: u64,
        tx: mpsc::Sender<ChatEvent>,
    },
    /// Release the subscription with the given id, if it is still the
    /// active one.
    Unsubscribe { id: u64 },
    /// Stop the router.
    Shutdown,
}

/// Anything the controller can publish an event through.
///
/// [`ChannelHandle`] is the real implementation; tests substitute their own.
pub trait PublishEvent {
    fn publish(&self, event: ChatEvent);
}

impl<T: PublishEvent + ?Sized> PublishEvent for Arc<T> {
    fn publish(&self, event: ChatEvent) {
        (**self).publish(event)
    }
}

/// Cloneable handle to the router task.
///
/// Created once at startup and passed to every view by construction; the
/// underlying connection is never torn down while the application runs.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    cmd_tx: mpsc::Sender<ChannelCommand>,
    next_subscription: Arc<AtomicU64>,
}

impl ChannelHandle {
    /// Take an exclusive inbound subscription.
    ///
    /// Subscribing while another [`Subscription`] is live replaces it; the
    /// router logs the replacement since the previous view should have
    /// dropped its guard first.
    pub fn subscribe(&self) -> Result<Subscription, ChannelError> {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(64);
        self.cmd_tx
            .try_send(ChannelCommand::Subscribe { id, tx })
            .map_err(|_| ChannelError::Closed)?;
        Ok(Subscription {
            id,
            rx,
            cmd_tx: self.cmd_tx.clone(),
        })
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.try_send(ChannelCommand::Shutdown);
    }
}

impl PublishEvent for ChannelHandle {
    /// Fire-and-forget: durability comes from the REST write path, so an
    /// unavailable channel only costs the low-latency notification.
    fn publish(&self, event: ChatEvent) {
        if self
            .cmd_tx
            .try_send(ChannelCommand::Publish(event))
            .is_err()
        {
            warn!("Realtime channel unavailable, dropping outbound event");
        }
    }
}

/// Scoped inbound subscription.
///
/// Owns the receiving end for the lifetime of one conversation view and
/// releases it on drop, so handlers cannot accumulate across navigations.
/// Release is keyed by id: dropping a stale guard after a new view has
/// subscribed does not disturb the newer subscription.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<ChatEvent>,
    cmd_tx: mpsc::Sender<ChannelCommand>,
}

impl Subscription {
    /// Next inbound event; `None` once the router is gone.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self
            .cmd_tx
            .try_send(ChannelCommand::Unsubscribe { id: self.id });
    }
}

/// Spawn the router task over a pair of wire channels.
///
/// `wire_tx` carries published events towards the socket task and `wire_rx`
/// delivers events the socket received. The socket side is separate so the
/// routing rules stay testable without a network connection.
pub fn spawn_router(
    wire_tx: mpsc::Sender<ChatEvent>,
    mut wire_rx: mpsc::Receiver<ChatEvent>,
) -> ChannelHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<ChannelCommand>(256);

    tokio::spawn(async move {
        let mut subscriber: Option<(u64, mpsc::Sender<ChatEvent>)> = None;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(ChannelCommand::Publish(event)) => {
                            if wire_tx.try_send(event).is_err() {
                                warn!("Outbound wire full or closed, dropping event");
                            }
                        }
                        Some(ChannelCommand::Subscribe { id, tx }) => {
                            if let Some((old_id, _)) = subscriber.replace((id, tx)) {
                                warn!(
                                    old_id,
                                    new_id = id,
                                    "Replacing live inbound subscription"
                                );
                            } else {
                                debug!(id, "Inbound subscription installed");
                            }
                        }
                        Some(ChannelCommand::Unsubscribe { id }) => {
                            if subscriber.as_ref().is_some_and(|(sid, _)| *sid == id) {
                                subscriber = None;
                                debug!(id, "Inbound subscription released");
                            }
                        }
                        Some(ChannelCommand::Shutdown) | None => break,
                    }
                }

                event = wire_rx.recv() => {
                    match event {
                        Some(event) => match &subscriber {
                            Some((id, tx)) => {
                                if tx.try_send(event).is_err() {
                                    debug!(id, "Subscriber gone or full, dropping inbound event");
                                }
                            }
                            // No view is listening; inbound events are not
                            // buffered for the next subscription.
                            None => debug!("No active subscription, dropping inbound event"),
                        },
                        None => break,
                    }
                }
            }
        }

        info!("Channel router terminated");
    });

    ChannelHandle {
        cmd_tx,
        next_subscription: Arc::new(AtomicU64::new(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::time::timeout;
    use uuid::Uuid;

    fn event(content: &str) -> ChatEvent {
        ChatEvent {
            id: Uuid::new_v4(),
            from: "bob".to_string(),
            to: "alice".to_string(),
            content: content.to_string(),
            is_ai: false,
            created_at: Utc::now(),
        }
    }

    fn router() -> (ChannelHandle, mpsc::Sender<ChatEvent>, mpsc::Receiver<ChatEvent>) {
        let (wire_tx, wire_out) = mpsc::channel(16);
        let (wire_in, wire_rx) = mpsc::channel(16);
        let handle = spawn_router(wire_tx, wire_rx);
        (handle, wire_in, wire_out)
    }

    async fn recv_or_timeout(sub: &mut Subscription) -> Option<ChatEvent> {
        timeout(Duration::from_millis(200), sub.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_publish_reaches_the_wire() {
        let (handle, _wire_in, mut wire_out) = router();
        handle.publish(event("hello"));
        let sent = timeout(Duration::from_millis(200), wire_out.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent.content, "hello");
    }

    #[tokio::test]
    async fn test_inbound_delivered_to_subscriber() {
        let (handle, wire_in, _wire_out) = router();
        let mut sub = handle.subscribe().unwrap();
        wire_in.send(event("ping")).await.unwrap();
        assert_eq!(recv_or_timeout(&mut sub).await.unwrap().content, "ping");
    }

    #[tokio::test]
    async fn test_inbound_without_subscriber_is_dropped() {
        let (handle, wire_in, _wire_out) = router();
        wire_in.send(event("lost")).await.unwrap();
        // Give the router a turn to process (and drop) the event.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut sub = handle.subscribe().unwrap();
        wire_in.send(event("kept")).await.unwrap();
        assert_eq!(recv_or_timeout(&mut sub).await.unwrap().content, "kept");
    }

    #[tokio::test]
    async fn test_new_subscription_replaces_previous() {
        let (handle, wire_in, _wire_out) = router();
        let mut first = handle.subscribe().unwrap();
        let mut second = handle.subscribe().unwrap();

        wire_in.send(event("ping")).await.unwrap();
        assert_eq!(recv_or_timeout(&mut second).await.unwrap().content, "ping");
        assert!(recv_or_timeout(&mut first).await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_stale_guard_keeps_newer_subscription() {
        let (handle, wire_in, _wire_out) = router();
        let stale = handle.subscribe().unwrap();
        let mut current = handle.subscribe().unwrap();
        drop(stale);

        wire_in.send(event("still here")).await.unwrap();
        assert_eq!(
            recv_or_timeout(&mut current).await.unwrap().content,
            "still here"
        );
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let (handle, wire_in, _wire_out) = router();
        let sub = handle.subscribe().unwrap();
        drop(sub);
        // Let the router process the release, then drop this event unheard.
        tokio::time::sleep(Duration::from_millis(20)).await;
        wire_in.send(event("after release")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut fresh = handle.subscribe().unwrap();
        wire_in.send(event("fresh")).await.unwrap();
        assert_eq!(recv_or_timeout(&mut fresh).await.unwrap().content, "fresh");
    }
}
