//! # docsphere-client
//!
//! Client-side state synchronization for the docsphere document
//! platform.
//!
//! Everything here runs on one event loop: "concurrency" means
//! interleaved asynchronous callbacks, not parallelism. The suspension
//! points are network request completion and timer expiry, and the
//! discipline throughout is *debounce-and-cancel*: arming a timer
//! replaces and aborts its predecessor, which is what gives last-edit-
//! wins semantics for both search and autosave.
//!
//! ## Components
//!
//! - [`HttpRemoteStore`]: `reqwest` adapter implementing the
//!   [`RemoteStore`](docsphere_core::RemoteStore) port.
//! - [`Debouncer`]: the single-pending-timer primitive.
//! - [`SearchEngine`]: keystroke stream to one in-flight user lookup,
//!   filtered against the current editor set and the acting user.
//! - [`SyncEngine`]: document load/edit/autosave state machine.
//! - [`InviteFlow`]: selected search result plus role, issued as a
//!   permission grant and merged back into the sync engine's editor
//!   list.
//! - [`Catalog`]: document listing, deletion, download and analytics,
//!   with TTL-cached lists.

pub mod catalog;
pub mod config;
pub mod debounce;
pub mod error;
pub mod http;
pub mod invite;
pub mod search;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

// ── re-exports ───────────────────────────────────────────────────────

pub use catalog::Catalog;
pub use config::ClientConfig;
pub use debounce::Debouncer;
pub use error::{ClientError, ClientResult};
pub use http::HttpRemoteStore;
pub use invite::InviteFlow;
pub use search::SearchEngine;
pub use sync::{EditField, SyncEngine, SyncPhase, SyncStatus};
