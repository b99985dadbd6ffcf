//! Lazily-expiring TTL cache.
//!
//! Pure bookkeeping with no I/O: entries are stamped at insert and
//! treated as absent once they have aged past the cache's TTL. Expiry
//! is checked on read — there is no background sweep. Lookups are
//! synchronous so callers can consult cached state (e.g. the profile
//! used for capability checks) without suspending.
//!
//! Timestamps use [`tokio::time::Instant`] so expiry is deterministic
//! under the runtime's paused test clock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

// ── cache stats ──────────────────────────────────────────────────────

/// Counters tracking cache effectiveness.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Total cache hits since creation.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses since creation. Expired reads count as
    /// misses.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hits={} misses={}", self.hits(), self.misses())
    }
}

// ── entries ──────────────────────────────────────────────────────────

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

// ── cache ────────────────────────────────────────────────────────────

/// A keyed cache where every entry expires `ttl` after it was stored.
///
/// Observed policies in the client: 5 minutes for list caches,
/// 10 minutes for the profile cache.
pub struct TtlCache<T> {
    name: &'static str,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<T>>>,
    stats: CacheStats,
}

impl<T: Clone> TtlCache<T> {
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: Mutex::new(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    /// Look up a value. An entry older than the TTL is removed and
    /// reported absent.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                self.stats.record_hit();
                debug!(cache = self.name, key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.stats.record_miss();
                debug!(cache = self.name, key, "cache entry expired");
                None
            }
            None => {
                self.stats.record_miss();
                debug!(cache = self.name, key, "cache miss");
                None
            }
        }
    }

    /// Insert a value, overwriting and restamping any existing entry.
    pub fn insert(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        debug!(cache = self.name, key, "cache insert");
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove a specific entry.
    pub fn invalidate(&self, key: &str) {
        debug!(cache = self.name, key, "cache invalidate");
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }

    /// Remove all entries.
    pub fn invalidate_all(&self) {
        debug!(cache = self.name, "cache invalidate_all");
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Remove every entry whose key matches `pattern`. An invalid
    /// pattern is logged and treated as a no-op; cache logic never
    /// raises to the user.
    pub fn invalidate_matching(&self, pattern: &str) {
        let regex = match regex::Regex::new(pattern) {
            Ok(regex) => regex,
            Err(err) => {
                warn!(cache = self.name, pattern, %err, "invalid invalidation pattern, ignoring");
                return;
            }
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| !regex.is_match(key));
        debug!(
            cache = self.name,
            pattern,
            removed = before - entries.len(),
            "cache invalidate_matching"
        );
    }

    /// Current number of entries, including any not yet lazily
    /// expired.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

// ── tests ────────────────────────────────────────────────────────────
