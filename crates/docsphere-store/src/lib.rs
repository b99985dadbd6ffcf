//! # docsphere-store
//!
//! Local durable state for the docsphere client.
//!
//! Provides SQLite-backed key-value persistence for the session
//! (token + profile snapshot), a generic lazily-expiring TTL cache,
//! and the [`SessionStore`] that owns the authentication credential.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  SessionStore (credential owner)         │
//! ├──────────────────────────────────────────┤
//! │  TtlCache<T>  (lazy expiry, in-memory)   │
//! │  LocalState   (token / userData rows)    │
//! ├──────────────────────────────────────────┤
//! │  Database (rusqlite WAL, spawn_blocking) │
//! └──────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod db;
pub mod error;
pub mod kv;
pub mod session;

// ── re-exports ───────────────────────────────────────────────────────

pub use cache::{CacheStats, TtlCache};
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use kv::{KEY_TOKEN, KEY_USER_DATA, LocalState};
pub use session::{CurrentUser, SessionStore};
