//! In-memory remote store fake shared by the component tests.
//!
//! Records every request it receives and serves canned responses, so
//! tests can assert on coalescing and cancellation (how many requests
//! were actually issued, and with what payload) under the runtime's
//! paused clock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use docsphere_core::{
    Analytics, AuthPayload, Credentials, Document, DocumentEditor, DocumentList, DocumentPayload,
    EditorGrant, EditorRole, RemoteError, RemoteResult, RemoteStore, Role, User,
};

/// A recorded `update_document` request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SaveRequest {
    pub id: i64,
    pub title: String,
    pub markdown: String,
}

#[derive(Default)]
pub(crate) struct FakeRemote {
    // Search.
    pub users: Mutex<Vec<User>>,
    pub search_calls: Mutex<Vec<String>>,
    pub fail_search: AtomicBool,

    // Documents.
    pub documents: Mutex<HashMap<i64, DocumentPayload>>,
    pub update_calls: Mutex<Vec<SaveRequest>>,
    /// Updates that ran to completion. Stays behind `update_calls`
    /// when a request is torn down mid-flight.
    pub completed_updates: Mutex<Vec<SaveRequest>>,
    pub fail_update: AtomicBool,
    /// Simulated latency for update requests, for in-flight tests.
    pub update_delay: Mutex<Duration>,

    // Editor grants. `directory` resolves granted user ids to users.
    pub directory: Mutex<HashMap<i64, User>>,
    pub editors: Mutex<Vec<DocumentEditor>>,
    pub add_editor_calls: Mutex<Vec<(i64, Vec<EditorGrant>)>>,
    pub fail_add_editors: Mutex<Option<RemoteError>>,

    // Catalog.
    pub list: Mutex<DocumentList>,
    pub list_calls: AtomicU64,
    pub delete_calls: Mutex<Vec<i64>>,
    pub fail_analytics: AtomicBool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve_document(&self, id: i64, document: Document, file: &str) {
        self.documents.lock().unwrap().insert(
            id,
            DocumentPayload {
                document,
                file: file.to_string(),
            },
        );
    }

    pub fn add_to_directory(&self, user: User) {
        self.directory.lock().unwrap().insert(user.id, user);
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.update_calls.lock().unwrap().clone()
    }

    pub fn completed_saves(&self) -> Vec<SaveRequest> {
        self.completed_updates.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }
}

pub(crate) fn user(id: i64, role: Role) -> User {
    User {
        id,
        first_name: format!("user{id}"),
        last_name: "example".into(),
        email: format!("user{id}@example.com"),
        avatar_url: None,
        role,
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn create_session(&self, _credentials: &Credentials) -> RemoteResult<AuthPayload> {
        Err(RemoteError::ConnectionRefused)
    }

    async fn create_user(&self, _credentials: &Credentials) -> RemoteResult<AuthPayload> {
        Err(RemoteError::ConnectionRefused)
    }

    async fn fetch_document(&self, id: i64) -> RemoteResult<DocumentPayload> {
        self.documents
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RemoteError::NotFoundOrForbidden)
    }

    async fn update_document(&self, id: i64, title: &str, markdown: &str) -> RemoteResult<()> {
        let request = SaveRequest {
            id,
            title: title.to_string(),
            markdown: markdown.to_string(),
        };
        self.update_calls.lock().unwrap().push(request.clone());
        let delay = *self.update_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 500,
                body: String::new(),
            });
        }
        self.completed_updates.lock().unwrap().push(request);
        Ok(())
    }

    async fn list_documents(&self) -> RemoteResult<DocumentList> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.list.lock().unwrap().clone())
    }

    async fn download_document(&self, id: i64) -> RemoteResult<Vec<u8>> {
        self.documents
            .lock()
            .unwrap()
            .get(&id)
            .map(|payload| payload.file.clone().into_bytes())
            .ok_or(RemoteError::NotFoundOrForbidden)
    }

    async fn delete_document(&self, id: i64) -> RemoteResult<()> {
        self.delete_calls.lock().unwrap().push(id);
        Ok(())
    }

    async fn search_users(&self, query: &str) -> RemoteResult<Vec<User>> {
        self.search_calls.lock().unwrap().push(query.to_string());
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 500,
                body: String::new(),
            });
        }
        Ok(self.users.lock().unwrap().clone())
    }

    async fn add_editors(
        &self,
        document_id: i64,
        grants: &[EditorGrant],
    ) -> RemoteResult<Vec<DocumentEditor>> {
        self.add_editor_calls
            .lock()
            .unwrap()
            .push((document_id, grants.to_vec()));
        if let Some(err) = self.fail_add_editors.lock().unwrap().take() {
            return Err(err);
        }

        // Merge like the server does: unique by user, last role wins.
        let directory = self.directory.lock().unwrap();
        let mut editors = self.editors.lock().unwrap();
        for grant in grants {
            let user = directory
                .get(&grant.user_id)
                .cloned()
                .unwrap_or_else(|| user(grant.user_id, Role::Student));
            let editor = DocumentEditor {
                user,
                role: grant.role,
            };
            match editors.iter_mut().find(|e| e.user.id == grant.user_id) {
                Some(existing) => *existing = editor,
                None => editors.push(editor),
            }
        }
        Ok(editors.clone())
    }

    async fn fetch_analytics(&self, _id: i64) -> RemoteResult<Analytics> {
        if self.fail_analytics.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 500,
                body: String::new(),
            });
        }
        Ok(Analytics { unique_views: 42 })
    }

    fn install_credential(&self, _token: &str) {}

    fn clear_credential(&self) {}
}

/// Let spawned debounce tasks run to completion on the current-thread
/// test runtime.
pub(crate) async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Shorthand for an editor grant in assertions.
pub(crate) fn grant(user_id: i64, role: EditorRole) -> EditorGrant {
    EditorGrant { user_id, role }
}
