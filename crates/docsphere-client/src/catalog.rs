//! Document catalog: listing, deletion, download, analytics.
//!
//! Listings are served from a TTL cache (5 minutes in the default
//! configuration) keyed `"documents"`; destructive operations
//! invalidate every `documents*` key by pattern so the next read
//! refetches.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use docsphere_core::{Analytics, DocumentList, RemoteStore};
use docsphere_store::TtlCache;

use crate::error::{ClientError, ClientResult};

const LIST_KEY: &str = "documents";

/// Cached view over the caller's documents on the remote store.
pub struct Catalog {
    remote: Arc<dyn RemoteStore>,
    lists: TtlCache<DocumentList>,
}

impl Catalog {
    /// Create a catalog whose listings stay fresh for `list_ttl`.
    pub fn new(remote: Arc<dyn RemoteStore>, list_ttl: Duration) -> Self {
        Self {
            remote,
            lists: TtlCache::new("documents", list_ttl),
        }
    }

    /// Owned and shared documents, served from cache when unexpired.
    pub async fn list_documents(&self) -> ClientResult<DocumentList> {
        if let Some(cached) = self.lists.get(LIST_KEY) {
            return Ok(cached);
        }
        let list = self.remote.list_documents().await?;
        self.lists.insert(LIST_KEY, list.clone());
        Ok(list)
    }

    /// Drop the cached listing and refetch.
    pub async fn refresh(&self) -> ClientResult<DocumentList> {
        self.lists.invalidate(LIST_KEY);
        self.list_documents().await
    }

    /// Delete a document, then invalidate every cached listing.
    pub async fn delete_document(&self, id: i64) -> ClientResult<()> {
        self.remote.delete_document(id).await?;
        self.lists.invalidate_matching("^documents");
        debug!(document_id = id, "document deleted, listings invalidated");
        Ok(())
    }

    /// Raw markdown bytes of a document, for saving to disk.
    pub async fn download_document(&self, id: i64) -> ClientResult<Vec<u8>> {
        Ok(self.remote.download_document(id).await?)
    }

    /// View counters for a document. Failures are soft: the caller
    /// gets the fixed analytics message and the page renders without
    /// counters.
    pub async fn fetch_analytics(&self, id: i64) -> ClientResult<Analytics> {
        match self.remote.fetch_analytics(id).await {
            Ok(analytics) => Ok(analytics),
            Err(err) => {
                warn!(document_id = id, %err, "analytics fetch failed");
                Err(ClientError::Analytics)
            }
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────
