//! Document load / edit / autosave state machine.
//!
//! Phases: `Idle → Loading → Ready ⇄ Dirty → Saving → Ready`, plus the
//! terminal `NotFound` and `Failed`. Edits apply to local state
//! immediately and re-arm a debounced save; the save that eventually
//! fires snapshots the *current* title and body, so edits made during
//! the quiet period ride along. Only the latest full document state is
//! ever sent, never a per-keystroke diff.
//!
//! At most one update request is in flight per engine, and a request
//! already on the wire is never canceled: re-arming the timer aborts
//! only timers still sleeping, because a fired timer hands the save to
//! a detached task. An edit arriving while a save is in flight is
//! captured locally, moves the phase back to `Dirty` (so the in-flight
//! completion cannot clobber it to clean `Ready`), and is carried by
//! the next debounced save. A failed save is recorded softly and never
//! retried automatically; the next edit re-arms a fresh attempt.
//!
//! Mutation entry points are capability-gated once, here: a caller
//! whose role lacks edit capability is refused with no state change
//! and no request.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use docsphere_core::{Capabilities, Document, DocumentEditor, RemoteStore};

use crate::debounce::Debouncer;
use crate::error::{ClientError, ClientResult};

const SAVE_FALLBACK: &str = "Failed to save document.";

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No document requested yet.
    Idle,
    /// A load is in progress.
    Loading,
    /// Document present, no unsaved edits.
    Ready,
    /// Unsaved local edits; a save timer is (or was) armed.
    Dirty,
    /// An update request is in flight.
    Saving,
    /// The store reported no such document or no permission.
    NotFound,
    /// The load failed for any other reason.
    Failed,
}

/// Which document field an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Body,
}

/// Snapshot of the engine for rendering.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    pub document: Option<Document>,
    /// When the document was last known saved (the loaded
    /// `updated_at`, then each successful autosave).
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Message from the most recent failed autosave, cleared by the
    /// next success.
    pub save_error: Option<String>,
    /// Message from a failed load.
    pub load_error: Option<String>,
}

/// Keeps one local document in sync with the remote store.
pub struct SyncEngine {
    inner: Arc<Shared>,
}

struct Shared {
    remote: Arc<dyn RemoteStore>,
    capabilities: Capabilities,
    quiet: Duration,
    debounce: Debouncer,
    /// Serializes update requests: at most one in flight per engine.
    save_gate: tokio::sync::Mutex<()>,
    state: Mutex<State>,
}

struct State {
    phase: SyncPhase,
    document: Option<Document>,
    last_saved_at: Option<DateTime<Utc>>,
    save_error: Option<String>,
    load_error: Option<String>,
}

impl SyncEngine {
    /// Create an engine for the acting user's capability set with the
    /// given autosave quiet period (1000 ms in the default
    /// configuration).
    pub fn new(remote: Arc<dyn RemoteStore>, capabilities: Capabilities, quiet: Duration) -> Self {
        Self {
            inner: Arc::new(Shared {
                remote,
                capabilities,
                quiet,
                debounce: Debouncer::new(),
                save_gate: tokio::sync::Mutex::new(()),
                state: Mutex::new(State {
                    phase: SyncPhase::Idle,
                    document: None,
                    last_saved_at: None,
                    save_error: None,
                    load_error: None,
                }),
            }),
        }
    }

    // ── loading ──────────────────────────────────────────────────────

    /// Load a document by id.
    ///
    /// `NotFoundOrForbidden` lands in the distinct `NotFound` phase.
    /// An absent document and a permission refusal render the same
    /// way, and neither is a generic error.
    pub async fn load(&self, id: i64) -> ClientResult<()> {
        {
            let mut state = self.inner.lock_state();
            state.phase = SyncPhase::Loading;
            state.document = None;
            state.load_error = None;
            state.save_error = None;
        }

        match self.inner.remote.fetch_document(id).await {
            Ok(payload) => {
                let mut document = payload.document;
                document.id = document.id.or(Some(id));
                document.body = payload.file;
                let mut state = self.inner.lock_state();
                state.last_saved_at = document.updated_at;
                state.phase = SyncPhase::Ready;
                info!(document_id = id, "document loaded");
                state.document = Some(document);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                self.inner.lock_state().phase = SyncPhase::NotFound;
                debug!(document_id = id, "document not found or forbidden");
                Err(ClientError::Remote(err))
            }
            Err(err) => {
                let mut state = self.inner.lock_state();
                state.phase = SyncPhase::Failed;
                state.load_error = Some(err.user_message("Failed to load document"));
                warn!(document_id = id, %err, "document load failed");
                Err(ClientError::Remote(err))
            }
        }
    }

    /// Start a new, unsaved document: no identity, no load, directly
    /// `Ready`. Gated like every other mutation entry point.
    pub fn new_document(&self, title: impl Into<String>) -> ClientResult<()> {
        if !self.inner.capabilities.can_edit {
            return Err(ClientError::ReadOnly);
        }
        let mut state = self.inner.lock_state();
        state.document = Some(Document::draft(title));
        state.phase = SyncPhase::Ready;
        state.last_saved_at = None;
        state.save_error = None;
        state.load_error = None;
        Ok(())
    }

    // ── editing ──────────────────────────────────────────────────────

    /// Apply an edit to the title or body.
    ///
    /// Optimistic: local state changes immediately and the save timer
    /// is re-armed, canceling any previously armed timer. Refused with
    /// [`ClientError::ReadOnly`] (no state change, no request) when
    /// the acting user lacks edit capability.
    pub fn edit(&self, field: EditField, value: impl Into<String>) -> ClientResult<()> {
        if !self.inner.capabilities.can_edit {
            return Err(ClientError::ReadOnly);
        }

        {
            let mut guard = self.inner.lock_state();
            let state = &mut *guard;
            match state.phase {
                SyncPhase::Ready | SyncPhase::Dirty | SyncPhase::Saving => {}
                _ => return Err(ClientError::Validation("no active document".into())),
            }
            let Some(document) = state.document.as_mut() else {
                return Err(ClientError::Validation("no active document".into()));
            };
            match field {
                EditField::Title => document.title = value.into(),
                EditField::Body => document.body = value.into(),
            }
            // Also the path out of `Saving`: the in-flight completion
            // only restores `Ready` if the phase is still `Saving`.
            state.phase = SyncPhase::Dirty;
        }

        let shared = Arc::clone(&self.inner);
        self.inner.debounce.arm(self.inner.quiet, async move {
            // Detached on purpose: once the quiet period has elapsed
            // the save must run to completion. A newer edit aborts
            // only a still-sleeping timer, never a request already on
            // the wire.
            tokio::spawn(shared.flush());
        });
        Ok(())
    }

    /// Merge granted permissions into the editor list: unique by user
    /// id, last write wins on role, invitation order preserved.
    pub fn add_editors(&self, grants: Vec<DocumentEditor>) {
        let mut state = self.inner.lock_state();
        if let Some(document) = state.document.as_mut() {
            document.merge_editors(grants);
        }
    }

    // ── reads ────────────────────────────────────────────────────────

    /// The persisted identity of the active document, if it has one.
    pub fn document_id(&self) -> Option<i64> {
        self.inner.lock_state().document.as_ref().and_then(|d| d.id)
    }

    /// Ids of all current grant holders, for search exclusion.
    pub fn editor_ids(&self) -> Vec<i64> {
        self.inner
            .lock_state()
            .document
            .as_ref()
            .map(|d| d.editor_ids())
            .unwrap_or_default()
    }

    /// Current snapshot for rendering.
    pub fn status(&self) -> SyncStatus {
        let state = self.inner.lock_state();
        SyncStatus {
            phase: state.phase,
            document: state.document.clone(),
            last_saved_at: state.last_saved_at,
            save_error: state.save_error.clone(),
            load_error: state.load_error.clone(),
        }
    }

    /// Cancel the pending save timer. Called on view teardown; unsaved
    /// local edits are abandoned with it. A save already handed to the
    /// network still runs to completion.
    pub fn shutdown(&self) {
        self.inner.debounce.cancel();
    }
}

impl Shared {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs when the save timer fires: one update request carrying the
    /// state as of now, serialized behind the save gate.
    async fn flush(self: Arc<Self>) {
        // If a previous save is still in flight, wait for it; the
        // snapshot below then includes everything edited since.
        let _gate = self.save_gate.lock().await;

        let snapshot = {
            let mut state = self.lock_state();
            // A draft has no endpoint to save to yet; it stays Dirty
            // until it is given an identity.
            let snapshot = state.document.as_ref().and_then(|document| {
                document
                    .id
                    .map(|id| (id, document.title.clone(), document.body.clone()))
            });
            if snapshot.is_some() {
                state.phase = SyncPhase::Saving;
            }
            snapshot
        };
        let Some((id, title, body)) = snapshot else {
            debug!("save fired with no persistable document, skipping");
            return;
        };

        debug!(document_id = id, "autosave issuing update");
        match self.remote.update_document(id, &title, &body).await {
            Ok(()) => {
                let mut state = self.lock_state();
                if state.phase == SyncPhase::Saving {
                    state.phase = SyncPhase::Ready;
                }
                state.last_saved_at = Some(Utc::now());
                state.save_error = None;
                debug!(document_id = id, "autosave succeeded");
            }
            Err(err) => {
                // Soft failure: edits stay applied, nothing retries
                // until the next edit re-arms the timer.
                let mut state = self.lock_state();
                if state.phase == SyncPhase::Saving {
                    state.phase = SyncPhase::Ready;
                }
                state.save_error = Some(err.user_message(SAVE_FALLBACK));
                warn!(document_id = id, %err, "autosave failed");
            }
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────
