//! Error types for the docsphere-client crate.
//!
//! Remote failures arrive as [`RemoteError`] from the port and are
//! either passed through or converted into a component-level variant
//! at the boundary. Nothing in this crate panics on a failed request.

use docsphere_core::RemoteError;
use thiserror::Error;

/// Alias for `Result<T, ClientError>`.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the client components.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A mutation entry point was called by a user without edit
    /// capability. No state changed and no request was issued.
    #[error("the current user does not have edit permission")]
    ReadOnly,

    /// Required local input was missing; short-circuits before any
    /// request is sent.
    #[error("{0}")]
    Validation(String),

    /// The store rejected the operation; the messages are shown to the
    /// user verbatim.
    #[error("{}", .messages.join(", "))]
    Rejected { messages: Vec<String> },

    /// Analytics could not be fetched. Soft failure with a fixed
    /// message.
    #[error("Server error while fetching analytics")]
    Analytics,

    /// Client configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Any other remote failure, unclassified at this level.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
