use thiserror::Error;
use uuid::Uuid;

use amity_net::ApiError;

/// Errors surfaced at the controller boundary.
///
/// Nothing here is fatal: validation errors are fixed by the user, transport
/// errors leave the view in `Idle` with a retry affordance, and a failed send
/// stays visible in the log flagged for retry.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected before any network call.
    #[error("Message content is empty")]
    EmptyMessage,

    /// No conversation is ready to send into.
    #[error("No active conversation")]
    NoConversation,

    /// History fetch failed.
    #[error("Transport error: {0}")]
    Transport(#[from] ApiError),

    /// The durable write failed after the optimistic append; the message is
    /// still in the log, marked failed.
    #[error("Message {id} could not be persisted: {source}")]
    SendFailed { id: Uuid, source: ApiError },

    /// Retry requested for an id the active conversation does not contain.
    #[error("No message {0} in the active conversation")]
    UnknownMessage(Uuid),
}
