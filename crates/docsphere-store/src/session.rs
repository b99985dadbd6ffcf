//! Session persistence and credential ownership.
//!
//! The [`SessionStore`] is the sole writer of the installed request
//! credential. It persists the opaque token and the profile snapshot
//! together (one transaction), restores them on process start, and
//! answers synchronous capability questions from the cached profile;
//! [`SessionStore::current_user`] never touches the network.
//!
//! Auth failures are classified into a single human-readable string
//! (joined validation errors, the fixed connection advisory, or a
//! generic fallback) and never propagate as panics; a failed login or
//! signup leaves the prior session untouched.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use docsphere_core::{Capabilities, Credentials, RemoteStore, User, UserPatch};

use crate::cache::TtlCache;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::kv::{KEY_TOKEN, KEY_USER_DATA, LocalState};

/// Profile snapshots are trusted for ten minutes.
const PROFILE_TTL: Duration = Duration::from_secs(10 * 60);
/// Single-entry key inside the profile cache.
const PROFILE_KEY: &str = "profile";

const LOGIN_FALLBACK: &str = "Login failed. Please try again.";
const SIGNUP_FALLBACK: &str = "Signup failed. Please try again.";

/// What is known about the acting user without any network call.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentUser {
    /// A cached, unexpired profile snapshot.
    Known(User),
    /// A restored token with no usable profile snapshot.
    TokenOnly(String),
}

/// Owns the authentication token and the cached profile.
pub struct SessionStore {
    state: LocalState,
    remote: Arc<dyn RemoteStore>,
    profile: TtlCache<User>,
    /// In-memory mirror of the installed token, so capability checks
    /// stay synchronous.
    token: Mutex<Option<String>>,
    last_error: Mutex<Option<String>>,
}

impl SessionStore {
    /// Create a session store over the local database and the remote
    /// port. No state is read until [`restore`](Self::restore).
    pub fn new(db: Database, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            state: LocalState::new(db),
            remote,
            profile: TtlCache::new("profile", PROFILE_TTL),
            token: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    // ── lifecycle ────────────────────────────────────────────────────

    /// Restore a persisted session on process start.
    ///
    /// If a token is present it is installed as the default credential
    /// and any persisted profile snapshot is loaded into the cache. A
    /// malformed snapshot is deleted (the token is kept) and the
    /// session degrades to token-only rather than failing. Returns
    /// whether a session was restored.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> StoreResult<bool> {
        let Some(token) = self.state.get(KEY_TOKEN).await? else {
            debug!("no persisted session");
            return Ok(false);
        };

        self.remote.install_credential(&token);
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token);

        if let Some(raw) = self.state.get(KEY_USER_DATA).await? {
            match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    debug!(user_id = user.id, "profile snapshot restored");
                    self.profile.insert(PROFILE_KEY, user);
                }
                Err(err) => {
                    warn!(%err, "persisted profile snapshot malformed, discarding");
                    self.state.delete(KEY_USER_DATA).await?;
                }
            }
        }

        info!("session restored");
        Ok(true)
    }

    /// Log in with the given credentials.
    ///
    /// On success the token and profile are persisted atomically, the
    /// credential is installed, and the profile cache is primed. On
    /// failure the classified message is recorded and returned as
    /// [`StoreError::Auth`]; the prior session is untouched.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> StoreResult<User> {
        let result = self.remote.create_session(credentials).await;
        self.finish_auth(result, LOGIN_FALLBACK).await
    }

    /// Create an account with the given credentials. Same persistence
    /// and failure semantics as [`login`](Self::login).
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn signup(&self, credentials: &Credentials) -> StoreResult<User> {
        let result = self.remote.create_user(credentials).await;
        self.finish_auth(result, SIGNUP_FALLBACK).await
    }

    /// Clear the persisted session, the installed credential, the
    /// profile cache, and any recorded auth error.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> StoreResult<()> {
        self.state.delete_many(vec![KEY_TOKEN, KEY_USER_DATA]).await?;
        self.remote.clear_credential();
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.profile.invalidate_all();
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
        info!("session cleared");
        Ok(())
    }

    // ── reads ────────────────────────────────────────────────────────

    /// What is known about the acting user, from local state only.
    ///
    /// Synchronous by design: rendering decides capabilities from this
    /// without suspending, and it never issues a request. An expired
    /// profile degrades to the token-only shape.
    pub fn current_user(&self) -> Option<CurrentUser> {
        if let Some(user) = self.profile.get(PROFILE_KEY) {
            return Some(CurrentUser::Known(user));
        }
        self.token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .map(CurrentUser::TokenOnly)
    }

    /// Capability set of the acting user. Unknown or token-only
    /// sessions are view-only.
    pub fn capabilities(&self) -> Capabilities {
        match self.current_user() {
            Some(CurrentUser::Known(user)) => user.role.capabilities(),
            _ => Capabilities::view_only(),
        }
    }

    /// The message from the most recent failed login/signup, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // ── local profile patch ──────────────────────────────────────────

    /// Merge a partial update into the cached profile and re-persist
    /// the snapshot. Purely local; a full refresh is a separate
    /// concern. Fails with `NotFound` when no profile is cached.
    pub async fn update_profile(&self, patch: &UserPatch) -> StoreResult<User> {
        let Some(mut user) = self.profile.get(PROFILE_KEY) else {
            return Err(StoreError::NotFound {
                entity: "profile",
                id: PROFILE_KEY.to_string(),
            });
        };

        patch.apply_to(&mut user);
        self.state
            .put(KEY_USER_DATA, serde_json::to_string(&user)?)
            .await?;
        self.profile.insert(PROFILE_KEY, user.clone());
        debug!(user_id = user.id, "profile patched locally");
        Ok(user)
    }

    // ── internals ────────────────────────────────────────────────────

    async fn finish_auth(
        &self,
        result: docsphere_core::RemoteResult<docsphere_core::AuthPayload>,
        fallback: &str,
    ) -> StoreResult<User> {
        match result {
            Ok(payload) => {
                self.state
                    .put_many(vec![
                        (KEY_TOKEN, payload.token.clone()),
                        (KEY_USER_DATA, serde_json::to_string(&payload.user)?),
                    ])
                    .await?;
                self.remote.install_credential(&payload.token);
                *self.token.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some(payload.token.clone());
                self.profile.insert(PROFILE_KEY, payload.user.clone());
                *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
                info!(user_id = payload.user.id, "authenticated");
                Ok(payload.user)
            }
            Err(err) => {
                let message = err.user_message(fallback);
                warn!(%err, "authentication failed");
                *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some(message.clone());
                Err(StoreError::Auth { message })
            }
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────
