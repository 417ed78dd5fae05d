//! # amity-client
//!
//! Conversation controller for the Amity messaging client: peer selection,
//! history loading, optimistic sends, and realtime merge rules. The
//! presentation layer drives a [`Controller`] from one task and renders its
//! conversation snapshot after every call.

pub mod config;
pub mod controller;
mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use controller::{Controller, HistoryTicket, ViewState};
pub use error::ClientError;

/// Install the global tracing subscriber. Call once at startup.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("amity_client=debug,amity_net=debug,amity_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
