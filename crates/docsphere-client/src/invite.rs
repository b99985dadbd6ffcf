//! Collaborator invitation flow.
//!
//! Holds exactly one selected search candidate and a role choice.
//! `invite` validates locally first (a candidate and a persisted
//! document identity must both exist, else nothing is sent),
//! issues a single permission-grant request, and on success merges the
//! returned editor set back into the sync engine. Remote rejections
//! keep the flow open for retry with the store's error list shown
//! verbatim; selecting a new candidate discards errors from a previous
//! attempt.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use docsphere_core::{EditorGrant, EditorRole, RemoteError, RemoteStore, User};

use crate::error::{ClientError, ClientResult};
use crate::sync::SyncEngine;

const MISSING_INPUT: &str = "Missing user or document information";
const INVITE_FALLBACK: &str = "Failed to invite editor. Please try again.";

/// One invitation attempt in progress.
pub struct InviteFlow {
    remote: Arc<dyn RemoteStore>,
    state: Mutex<State>,
}

struct State {
    candidate: Option<User>,
    role: EditorRole,
    errors: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            candidate: None,
            role: EditorRole::Viewer,
            errors: Vec::new(),
        }
    }
}

impl InviteFlow {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            state: Mutex::new(State::default()),
        }
    }

    /// Install the candidate to invite, discarding any error state
    /// from a previous attempt.
    pub fn select(&self, user: User) {
        let mut state = self.lock_state();
        debug!(user_id = user.id, "invite candidate selected");
        state.candidate = Some(user);
        state.errors.clear();
    }

    /// Choose the role for the pending invitation.
    pub fn set_role(&self, role: EditorRole) {
        self.lock_state().role = role;
    }

    pub fn candidate(&self) -> Option<User> {
        self.lock_state().candidate.clone()
    }

    /// Errors from the most recent failed attempt, verbatim.
    pub fn errors(&self) -> Vec<String> {
        self.lock_state().errors.clone()
    }

    /// Issue the permission grant for the selected candidate against
    /// the sync engine's active document.
    ///
    /// On success the returned editor set is merged into the engine
    /// and the flow closes. On failure the flow stays open: the
    /// candidate is retained and the errors are recorded for display.
    pub async fn invite(&self, sync: &SyncEngine) -> ClientResult<()> {
        let (candidate, role) = {
            let state = self.lock_state();
            (state.candidate.clone(), state.role)
        };
        let document_id = sync.document_id();

        let (Some(candidate), Some(document_id)) = (candidate, document_id) else {
            self.lock_state().errors = vec![MISSING_INPUT.to_string()];
            return Err(ClientError::Validation(MISSING_INPUT.into()));
        };

        let grants = [EditorGrant {
            user_id: candidate.id,
            role,
        }];
        match self.remote.add_editors(document_id, &grants).await {
            Ok(editors) => {
                debug!(
                    document_id,
                    user_id = candidate.id,
                    editors = editors.len(),
                    "invitation granted"
                );
                sync.add_editors(editors);
                self.close();
                Ok(())
            }
            Err(RemoteError::Validation(messages)) => {
                warn!(document_id, user_id = candidate.id, "invitation rejected");
                self.lock_state().errors = messages.clone();
                Err(ClientError::Rejected { messages })
            }
            Err(err) => {
                warn!(document_id, user_id = candidate.id, %err, "invitation failed");
                let messages = vec![INVITE_FALLBACK.to_string()];
                self.lock_state().errors = messages.clone();
                Err(ClientError::Rejected { messages })
            }
        }
    }

    /// Reset the flow: candidate, role, and errors.
    pub fn close(&self) {
        *self.lock_state() = State::default();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;

    use docsphere_core::{Document, Role};

    use crate::sync::{SyncEngine, SyncPhase};
    use crate::testing::{FakeRemote, grant, user};

    fn loaded_engine(remote: &Arc<FakeRemote>) -> SyncEngine {
        remote.serve_document(
            7,
            Document {
                id: Some(7),
                title: "Shared notes".into(),
                body: String::new(),
                updated_at: Some(Utc::now()),
                editors: Vec::new(),
            },
            "body",
        );
        SyncEngine::new(
            Arc::clone(remote) as Arc<dyn RemoteStore>,
            Role::Teacher.capabilities(),
            Duration::from_millis(1000),
        )
    }

    #[tokio::test]
    async fn invite_without_candidate_short_circuits() {
        let remote = Arc::new(FakeRemote::new());
        let engine = loaded_engine(&remote);
        engine.load(7).await.unwrap();
        let flow = InviteFlow::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        let err = flow.invite(&engine).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(flow.errors(), vec![MISSING_INPUT.to_string()]);
        // No request was sent.
        assert!(remote.add_editor_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invite_against_draft_document_short_circuits() {
        let remote = Arc::new(FakeRemote::new());
        let engine = SyncEngine::new(
            Arc::clone(&remote) as Arc<dyn RemoteStore>,
            Role::Teacher.capabilities(),
            Duration::from_millis(1000),
        );
        engine.new_document("draft").unwrap();
        let flow = InviteFlow::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
        flow.select(user(5, Role::Student));

        let err = flow.invite(&engine).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(remote.add_editor_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_invite_merges_editors_and_closes() {
        let remote = Arc::new(FakeRemote::new());
        remote.add_to_directory(user(5, Role::Student));
        let engine = loaded_engine(&remote);
        engine.load(7).await.unwrap();
        let flow = InviteFlow::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        flow.select(user(5, Role::Student));
        flow.set_role(EditorRole::Editor);
        flow.invite(&engine).await.unwrap();

        let calls = remote.add_editor_calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 7);
        assert_eq!(calls[0].1[0].user_id, grant(5, EditorRole::Editor).user_id);

        let doc = engine.status().document.unwrap();
        assert_eq!(doc.editors.len(), 1);
        assert_eq!(doc.editors[0].user.id, 5);
        assert_eq!(doc.editors[0].role, EditorRole::Editor);

        // Flow closed.
        assert!(flow.candidate().is_none());
        assert!(flow.errors().is_empty());
        assert_eq!(engine.status().phase, SyncPhase::Ready);
    }

    #[tokio::test]
    async fn repeated_invite_keeps_one_editor_with_latest_role() {
        let remote = Arc::new(FakeRemote::new());
        remote.add_to_directory(user(5, Role::Student));
        let engine = loaded_engine(&remote);
        engine.load(7).await.unwrap();
        let flow = InviteFlow::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        flow.select(user(5, Role::Student));
        flow.set_role(EditorRole::Viewer);
        flow.invite(&engine).await.unwrap();

        flow.select(user(5, Role::Student));
        flow.set_role(EditorRole::Editor);
        flow.invite(&engine).await.unwrap();

        let doc = engine.status().document.unwrap();
        assert_eq!(doc.editors.len(), 1);
        assert_eq!(doc.editors[0].role, EditorRole::Editor);
    }

    #[tokio::test]
    async fn structured_rejection_surfaces_errors_verbatim_and_stays_open() {
        let remote = Arc::new(FakeRemote::new());
        let engine = loaded_engine(&remote);
        engine.load(7).await.unwrap();
        *remote.fail_add_editors.lock().unwrap() = Some(RemoteError::Validation(vec![
            "User is already an editor".into(),
        ]));
        let flow = InviteFlow::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
        flow.select(user(5, Role::Student));

        let err = flow.invite(&engine).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { .. }));
        assert_eq!(flow.errors(), vec!["User is already an editor".to_string()]);
        // Open for retry: the candidate is retained.
        assert_eq!(flow.candidate().map(|u| u.id), Some(5));
    }

    #[tokio::test]
    async fn unstructured_failure_uses_the_generic_message() {
        let remote = Arc::new(FakeRemote::new());
        let engine = loaded_engine(&remote);
        engine.load(7).await.unwrap();
        *remote.fail_add_editors.lock().unwrap() = Some(RemoteError::Status {
            status: 500,
            body: String::new(),
        });
        let flow = InviteFlow::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
        flow.select(user(5, Role::Student));

        flow.invite(&engine).await.unwrap_err();
        assert_eq!(flow.errors(), vec![INVITE_FALLBACK.to_string()]);
    }

    #[tokio::test]
    async fn selecting_a_new_candidate_clears_prior_errors() {
        let remote = Arc::new(FakeRemote::new());
        let engine = loaded_engine(&remote);
        engine.load(7).await.unwrap();
        *remote.fail_add_editors.lock().unwrap() = Some(RemoteError::Validation(vec![
            "User is already an editor".into(),
        ]));
        let flow = InviteFlow::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
        flow.select(user(5, Role::Student));
        flow.invite(&engine).await.unwrap_err();
        assert!(!flow.errors().is_empty());

        flow.select(user(6, Role::Student));
        assert!(flow.errors().is_empty());
    }
}
