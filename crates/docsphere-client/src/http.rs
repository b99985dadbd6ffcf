//! HTTP adapter for the remote document store.
//!
//! Implements the [`RemoteStore`] port over `reqwest`. One shared
//! client carries the installed bearer credential on every request;
//! the session store is the only writer of that credential.
//!
//! Response classification: 401/403/404 become
//! [`RemoteError::NotFoundOrForbidden`]; other non-success statuses
//! are parsed for the store's structured `errors` array or single
//! `message`; transport failures split into connection-refused,
//! timeout, and everything else.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use docsphere_core::{
    Analytics, AuthPayload, Credentials, DocumentEditor, DocumentList, DocumentPayload,
    EditorGrant, RemoteError, RemoteResult, RemoteStore, User,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

const USER_AGENT: &str = concat!("docsphere/", env!("CARGO_PKG_VERSION"));

/// `reqwest`-backed implementation of the remote store contract.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpRemoteStore {
    /// Build the adapter from client configuration. Fails if the
    /// underlying client rejects the configuration; the timeout and
    /// user agent are never silently dropped.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Whether a credential is currently installed.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    // ── request plumbing ─────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.read().unwrap_or_else(|e| e.into_inner()).as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if matches!(status.as_u16(), 401 | 403 | 404) {
            return Err(RemoteError::NotFoundOrForbidden);
        }
        let body = response.text().await.unwrap_or_default();
        Err(parse_error_body(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> RemoteResult<T> {
        let response = self.send(request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn create_session(&self, credentials: &Credentials) -> RemoteResult<AuthPayload> {
        let request = self
            .client
            .post(self.url("/sessions"))
            .json(&json!({ "user": credentials }));
        self.send_json(request).await
    }

    async fn create_user(&self, credentials: &Credentials) -> RemoteResult<AuthPayload> {
        let request = self
            .client
            .post(self.url("/users"))
            .json(&json!({ "user": credentials }));
        self.send_json(request).await
    }

    async fn fetch_document(&self, id: i64) -> RemoteResult<DocumentPayload> {
        let request = self.authorize(self.client.get(self.url(&format!("/documents/{id}"))));
        self.send_json(request).await
    }

    async fn update_document(&self, id: i64, title: &str, markdown: &str) -> RemoteResult<()> {
        let request = self
            .authorize(self.client.put(self.url(&format!("/documents/{id}"))))
            .json(&json!({ "document": { "title": title, "markdown": markdown } }));
        self.send(request).await?;
        Ok(())
    }

    async fn list_documents(&self) -> RemoteResult<DocumentList> {
        let request = self.authorize(self.client.get(self.url("/documents")));
        self.send_json(request).await
    }

    async fn download_document(&self, id: i64) -> RemoteResult<Vec<u8>> {
        let request =
            self.authorize(self.client.get(self.url(&format!("/documents/{id}/download"))));
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn delete_document(&self, id: i64) -> RemoteResult<()> {
        let request = self.authorize(self.client.delete(self.url(&format!("/documents/{id}"))));
        self.send(request).await?;
        Ok(())
    }

    async fn search_users(&self, query: &str) -> RemoteResult<Vec<User>> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            users: Vec<User>,
        }

        let request = self
            .authorize(self.client.get(self.url("/users")))
            .query(&[("query", query)]);
        let body: Body = self.send_json(request).await?;
        Ok(body.users)
    }

    async fn add_editors(
        &self,
        document_id: i64,
        grants: &[EditorGrant],
    ) -> RemoteResult<Vec<DocumentEditor>> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            editors: Vec<DocumentEditor>,
        }

        let request = self
            .authorize(
                self.client
                    .post(self.url(&format!("/documents/{document_id}/add_editors"))),
            )
            .json(&json!({ "document_editors": { "editors": grants } }));
        let body: Body = self.send_json(request).await?;
        Ok(body.editors)
    }

    async fn fetch_analytics(&self, id: i64) -> RemoteResult<Analytics> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            analytics: Analytics,
        }

        let request =
            self.authorize(self.client.get(self.url(&format!("/documents/{id}/analytics"))));
        let body: Body = self.send_json(request).await?;
        Ok(body.analytics)
    }

    fn install_credential(&self, token: &str) {
        debug!("credential installed");
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
    }

    fn clear_credential(&self) {
        debug!("credential cleared");
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

// ── error body parsing ───────────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Option<Vec<String>>,
    #[serde(default)]
    message: Option<String>,
}

/// Classify a non-success response body: structured `errors` array
/// first, then a single `message`, else the bare status.
fn parse_error_body(status: u16, body: &str) -> RemoteError {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(errors) = parsed.errors
            && !errors.is_empty()
        {
            return RemoteError::Validation(errors);
        }
        if let Some(message) = parsed.message {
            return RemoteError::Message(message);
        }
    }
    RemoteError::Status {
        status,
        body: body.to_string(),
    }
}

fn map_transport(err: reqwest::Error) -> RemoteError {
    if err.is_connect() {
        RemoteError::ConnectionRefused
    } else if err.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Transport(err.to_string())
    }
}

// ── tests ────────────────────────────────────────────────────────────
