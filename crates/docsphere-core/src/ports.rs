//! Port contract for the remote document store.
//!
//! [`RemoteStore`] mirrors the remote API's request/response contract
//! one method per endpoint. The production implementation lives in
//! `docsphere-client::http`; tests substitute in-memory fakes that
//! record calls and serve canned responses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Analytics, Credentials, Document, DocumentEditor, EditorRole, User};
use crate::error::RemoteResult;

// ── payloads ─────────────────────────────────────────────────────────

/// Response to `POST /sessions` and `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// Response to `GET /documents/:id`: document metadata plus the
/// rendered markdown body in `file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub document: Document,
    #[serde(default)]
    pub file: String,
}

/// Response to `GET /documents`: documents the caller owns and
/// documents shared with them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub shared_documents: Vec<Document>,
}

/// One entry of the `add_editors` request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EditorGrant {
    pub user_id: i64,
    pub role: EditorRole,
}

// ── port ─────────────────────────────────────────────────────────────

/// The remote document/user store, one method per endpoint.
///
/// Every request after authentication carries the installed bearer
/// credential. The session store is the sole writer of that
/// credential via [`install_credential`](RemoteStore::install_credential)
/// and [`clear_credential`](RemoteStore::clear_credential).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `POST /sessions {user: credentials}` — log in.
    async fn create_session(&self, credentials: &Credentials) -> RemoteResult<AuthPayload>;

    /// `POST /users {user: credentials}` — sign up.
    async fn create_user(&self, credentials: &Credentials) -> RemoteResult<AuthPayload>;

    /// `GET /documents/:id`.
    async fn fetch_document(&self, id: i64) -> RemoteResult<DocumentPayload>;

    /// `PUT /documents/:id {document: {title, markdown}}`.
    async fn update_document(&self, id: i64, title: &str, markdown: &str) -> RemoteResult<()>;

    /// `GET /documents`.
    async fn list_documents(&self) -> RemoteResult<DocumentList>;

    /// `GET /documents/:id/download` — raw markdown bytes.
    async fn download_document(&self, id: i64) -> RemoteResult<Vec<u8>>;

    /// `DELETE /documents/:id`.
    async fn delete_document(&self, id: i64) -> RemoteResult<()>;

    /// `GET /users?query=<text>`.
    async fn search_users(&self, query: &str) -> RemoteResult<Vec<User>>;

    /// `POST /documents/:id/add_editors` — grant permissions, returns
    /// the resulting editor set.
    async fn add_editors(
        &self,
        document_id: i64,
        grants: &[EditorGrant],
    ) -> RemoteResult<Vec<DocumentEditor>>;

    /// `GET /documents/:id/analytics`.
    async fn fetch_analytics(&self, id: i64) -> RemoteResult<Analytics>;

    /// Install `token` as the default credential for all subsequent
    /// requests.
    fn install_credential(&self, token: &str);

    /// Remove the installed credential.
    fn clear_credential(&self);
}
