use thiserror::Error;

// ── ApiError ────────────────────────────────────────────────────────

/// Failure reported by the remote truck service.
///
/// Every remote call in the store funnels its failure through this type
/// before it reaches the [`ErrorReporter`](crate::reporter::ErrorReporter).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),

    /// The service could not serve the call (non-HTTP services, test doubles).
    #[error("unavailable: {0}")]
    Unavailable(String),
}

// ── GridError ───────────────────────────────────────────────────────

/// Failure surfaced to the grid by the adapter.
///
/// Remote failures are NOT part of this type: the store reports them to the
/// user and the adapter's futures still resolve. See [`crate::adapter`].
#[derive(Debug, Error)]
pub enum GridError {
    /// The filter expression cannot be written as a transport string.
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Load options did not match the grid's wire shape.
    #[error("invalid load options: {0}")]
    InvalidOptions(String),

    /// The store task ended without reporting completion.
    #[error("store disconnected before the action settled")]
    Disconnected,
}
