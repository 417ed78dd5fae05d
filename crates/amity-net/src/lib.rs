// Transport layer: REST message API plus the process-wide realtime channel.

pub mod api;
pub mod channel;
mod error;
pub mod socket;

pub use api::{ApiClient, MessageApi, SendMessageRequest, StoredMessage};
pub use channel::{spawn_router, ChannelCommand, ChannelHandle, PublishEvent, Subscription};
pub use error::{ApiError, ChannelError};
pub use socket::{connect, SocketConfig};
