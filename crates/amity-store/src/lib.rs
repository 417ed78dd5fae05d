//! # amity-store
//!
//! In-memory message log for the active conversation.
//!
//! One [`Conversation`] holds the ordered messages for exactly one
//! (current user, peer) pair. Nothing is persisted: switching peers builds a
//! fresh `Conversation` and the old log is dropped.

pub mod conversation;

pub use conversation::Conversation;
