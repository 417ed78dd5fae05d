//! WebSocket side of the realtime channel.
//!
//! A dedicated task keeps the single process-wide connection alive,
//! reconnecting with a fixed delay when it drops. Frames are JSON
//! (`{"event": "message", "data": {...}}`); anything that does not parse as a
//! known frame is skipped. Outbound events queued while disconnected are
//! dropped, since the durable write path owns delivery.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use amity_shared::{ChatEvent, Frame};

use crate::channel::{spawn_router, ChannelHandle};

/// Realtime channel connection settings.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/socket`.
    pub url: String,
    /// Delay between reconnection attempts.
    pub reconnect_delay: Duration,
}

impl SocketConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            reconnect_delay: Duration::from_secs(3),
        }
    }
}

/// Spawn the socket task plus its router and return the shared handle.
pub fn connect(config: SocketConfig) -> ChannelHandle {
    let (outbound_tx, outbound_rx) = mpsc::channel(256);
    let (inbound_tx, inbound_rx) = mpsc::channel(256);

    let handle = spawn_router(outbound_tx, inbound_rx);
    tokio::spawn(socket_loop(config, outbound_rx, inbound_tx));
    handle
}

async fn socket_loop(
    config: SocketConfig,
    mut outbound_rx: mpsc::Receiver<ChatEvent>,
    inbound_tx: mpsc::Sender<ChatEvent>,
) {
    loop {
        let stream = match connect_async(config.url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!(url = %config.url, error = %e, "Channel connect failed, retrying");
                tokio::time::sleep(config.reconnect_delay).await;
                continue;
            }
        };

        info!(url = %config.url, "Realtime channel connected");
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(event) => {
                            let frame = Frame::Message(event);
                            let text = match serde_json::to_string(&frame) {
                                Ok(text) => text,
                                Err(e) => {
                                    error!(error = %e, "Failed to encode outbound frame");
                                    continue;
                                }
                            };
                            if let Err(e) = sink.send(WsMessage::text(text)).await {
                                warn!(error = %e, "Channel send failed, reconnecting");
                                break;
                            }
                        }
                        None => {
                            info!("Outbound side closed, socket task exiting");
                            return;
                        }
                    }
                }

                frame = source.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            match serde_json::from_str::<Frame>(&text) {
                                Ok(Frame::Message(event)) => {
                                    if inbound_tx.send(event).await.is_err() {
                                        info!("Router gone, socket task exiting");
                                        return;
                                    }
                                }
                                Err(e) => {
                                    debug!(error = %e, "Ignoring unrecognized frame");
                                }
                            }
                        }
                        Some(Ok(WsMessage::Close(_))) | None => {
                            warn!("Channel closed by server, reconnecting");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Channel read error, reconnecting");
                            break;
                        }
                    }
                }
            }
        }

        tokio::time::sleep(config.reconnect_delay).await;
    }
}
