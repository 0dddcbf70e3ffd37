//! Error types for the Tether domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each gateway has its own error enum; the top-level `Error` wraps them as
//! the conditions the orchestrator surfaces to its caller.

use thiserror::Error;

/// The top-level error type for all Tether operations.
///
/// The orchestrator never swallows a gateway failure into a fabricated
/// answer — it surfaces one of these so the caller can decide between
/// showing an error, retrying the whole turn, or answering ungrounded.
#[derive(Debug, Error)]
pub enum Error {
    /// The completion endpoint failed on either call of the cycle.
    #[error("Completion gateway unavailable: {0}")]
    CompletionUnavailable(#[from] CompletionError),

    /// The retrieval engine failed while servicing a tool invocation.
    #[error("Retrieval gateway unavailable: {0}")]
    RetrievalUnavailable(#[from] RetrievalError),

    /// The model produced a tool request missing or malforming a required
    /// argument. Not retried; never silently defaulted.
    #[error("Invalid tool arguments for {tool_name}: {reason}")]
    InvalidToolArguments { tool_name: String, reason: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Gateway errors ---

#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by endpoint, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Search request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Index holds no documents")]
    EmptyIndex,
}
