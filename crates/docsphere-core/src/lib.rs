//! # docsphere-core
//!
//! Pure domain types and port contracts for the docsphere client
//! synchronization layer.
//!
//! This crate defines the data model shared by every other crate
//! (users, documents, editor grants, roles and capabilities), the
//! [`RemoteStore`] port trait that mirrors the remote document store's
//! request/response contract, and the [`RemoteError`] taxonomy used to
//! classify remote failures. It performs no I/O of its own; concrete
//! transports and storage live in `docsphere-client` and
//! `docsphere-store`.

pub mod domain;
pub mod error;
pub mod ports;

// ── re-exports ───────────────────────────────────────────────────────

pub use domain::{
    Analytics, Capabilities, Credentials, Document, DocumentEditor, EditorRole, Role, User,
    UserPatch,
};
pub use error::{RemoteError, RemoteResult};
pub use ports::{AuthPayload, DocumentList, DocumentPayload, EditorGrant, RemoteStore};
