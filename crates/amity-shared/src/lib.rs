//! # amity-shared
//!
//! Domain types shared by every Amity client crate: peer identities,
//! the message model, and the realtime wire protocol.

pub mod message;
pub mod protocol;
pub mod types;

pub use message::Message;
pub use protocol::{ChatEvent, Frame, MESSAGE_EVENT};
pub use types::{DeliveryState, Peer, ASSISTANT_WIRE_NAME};
