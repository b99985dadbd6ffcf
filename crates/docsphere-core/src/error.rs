//! Remote failure taxonomy.
//!
//! Every operation on the [`RemoteStore`](crate::ports::RemoteStore)
//! port surfaces failures through [`RemoteError`]. Each variant
//! carries enough context for callers to decide how to handle the
//! failure without inspecting opaque strings; components convert it to
//! a single user-facing message via [`RemoteError::user_message`].

use thiserror::Error;

/// Alias for `Result<T, RemoteError>`.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Fixed advisory shown when the store is unreachable.
pub const CONNECTION_ADVISORY: &str =
    "Unable to connect to server. Please check if the backend is running.";

/// Unified error type for remote store operations.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The store rejected the request with a structured `errors`
    /// array. Surfaced to the user verbatim, joined into one line.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// The store rejected the request with a single `message`.
    #[error("{0}")]
    Message(String),

    /// The store is unreachable (connection refused or DNS failure).
    #[error("{}", CONNECTION_ADVISORY)]
    ConnectionRefused,

    /// The resource does not exist or the caller lacks permission.
    /// Rendered as a distinct not-found state, never a generic error
    /// banner.
    #[error("not found or access denied")]
    NotFoundOrForbidden,

    /// The request exceeded its time limit.
    #[error("request timed out")]
    Timeout,

    /// A non-success status with no parseable error body.
    #[error("unexpected status {status}")]
    Status { status: u16, body: String },

    /// The request could not be sent or the response not received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Render the single human-readable string shown to the user.
    ///
    /// Structured validation errors are joined verbatim; an
    /// unreachable store maps to the fixed connection advisory; a
    /// server-provided message passes through; everything else falls
    /// back to the caller's message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            RemoteError::Validation(errors) if !errors.is_empty() => errors.join(", "),
            RemoteError::Message(message) => message.clone(),
            RemoteError::ConnectionRefused => CONNECTION_ADVISORY.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Whether this failure should render as a not-found view.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFoundOrForbidden)
    }
}
