use thiserror::Error;

/// Errors produced by the REST message API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network-level failure or malformed response body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned {status} for {endpoint}")]
    Status {
        status: reqwest::StatusCode,
        endpoint: String,
    },

    /// The configured base URL and path do not form a valid request URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Errors produced by the realtime channel.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The router task is gone; no publishes or subscriptions are possible.
    #[error("Realtime channel is closed")]
    Closed,
}
