//! Debounced collaborator search.
//!
//! Turns a free-text query stream (one call per keystroke) into at
//! most one conceptual in-flight lookup. A new keystroke before the
//! quiet period elapses aborts the pending timer entirely, so no
//! request is ever sent for superseded text. The lookup reads the *latest*
//! recorded query and the exclusion sets at fire time, so edits and
//! grants made during the quiet period are respected.
//!
//! Search failures degrade to an empty result list; no error is
//! surfaced past this boundary.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use docsphere_core::{RemoteStore, User};

use crate::debounce::Debouncer;

/// Debounced user lookup with exclusion filtering.
pub struct SearchEngine {
    inner: Arc<Shared>,
}

struct Shared {
    remote: Arc<dyn RemoteStore>,
    quiet: Duration,
    debounce: Debouncer,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    query: String,
    results: Vec<User>,
    acting_user: Option<i64>,
    excluded_editors: HashSet<i64>,
}

impl SearchEngine {
    /// Create an engine over the remote port with the given quiet
    /// period (300 ms in the default configuration).
    pub fn new(remote: Arc<dyn RemoteStore>, quiet: Duration) -> Self {
        Self {
            inner: Arc::new(Shared {
                remote,
                quiet,
                debounce: Debouncer::new(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Exclude the acting user from published results.
    pub fn set_acting_user(&self, id: Option<i64>) {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner()).acting_user = id;
    }

    /// Exclude users already holding a grant on the current document.
    /// Read at fire time, so callers can update it as editors change.
    pub fn set_excluded_editors(&self, ids: impl IntoIterator<Item = i64>) {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .excluded_editors = ids.into_iter().collect();
    }

    /// Feed one keystroke's worth of query text.
    ///
    /// Empty (after trimming) text clears the results synchronously
    /// and issues nothing. Otherwise the pending timer is replaced and
    /// exactly one lookup for the latest text fires after the quiet
    /// period.
    pub fn on_query_change(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.inner.debounce.cancel();
            let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            state.query.clear();
            state.results.clear();
            return;
        }

        {
            let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            state.query = trimmed.to_string();
        }

        let shared = Arc::clone(&self.inner);
        self.inner.debounce.arm(self.inner.quiet, async move {
            shared.run_lookup().await;
        });
    }

    /// The currently published (filtered) results.
    pub fn results(&self) -> Vec<User> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .results
            .clone()
    }

    /// Cancel any pending lookup. Called on view teardown so a late
    /// callback cannot mutate released state.
    pub fn shutdown(&self) {
        self.inner.debounce.cancel();
    }
}

impl Shared {
    async fn run_lookup(self: Arc<Self>) {
        // Latest text, not the text present when the timer was armed.
        let query = self
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .query
            .clone();

        match self.remote.search_users(&query).await {
            Ok(users) => {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                let before = users.len();
                let acting_user = state.acting_user;
                let filtered: Vec<User> = users
                    .into_iter()
                    .filter(|user| {
                        Some(user.id) != acting_user
                            && !state.excluded_editors.contains(&user.id)
                    })
                    .collect();
                debug!(
                    query,
                    published = filtered.len(),
                    filtered = before - filtered.len(),
                    "search results published"
                );
                state.results = filtered;
            }
            Err(err) => {
                debug!(query, %err, "user search failed, clearing results");
                self.state
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .results
                    .clear();
            }
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use tokio::time::advance;

    use docsphere_core::Role;

    use crate::testing::{FakeRemote, settle, user};

    const QUIET: Duration = Duration::from_millis(300);

    fn engine(remote: &Arc<FakeRemote>) -> SearchEngine {
        SearchEngine::new(Arc::clone(remote) as Arc<dyn RemoteStore>, QUIET)
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_keystrokes_send_nothing() {
        let remote = Arc::new(FakeRemote::new());
        *remote.users.lock().unwrap() = vec![user(4, Role::Student)];
        let search = engine(&remote);

        search.on_query_change("a");
        advance(Duration::from_millis(100)).await;
        settle().await;
        search.on_query_change("al");
        advance(Duration::from_millis(100)).await;
        settle().await;
        search.on_query_change("ali");

        advance(Duration::from_millis(301)).await;
        settle().await;

        // Exactly one request, for the latest text only.
        assert_eq!(remote.searches(), vec!["ali".to_string()]);
        assert_eq!(search.results().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_uses_latest_text_at_fire_time() {
        let remote = Arc::new(FakeRemote::new());
        let search = engine(&remote);

        search.on_query_change("first");
        advance(Duration::from_millis(299)).await;
        settle().await;
        search.on_query_change("second");
        advance(Duration::from_millis(301)).await;
        settle().await;

        assert_eq!(remote.searches(), vec!["second".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_clears_synchronously_without_request() {
        let remote = Arc::new(FakeRemote::new());
        *remote.users.lock().unwrap() = vec![user(4, Role::Student)];
        let search = engine(&remote);

        search.on_query_change("alice");
        advance(Duration::from_millis(301)).await;
        settle().await;
        assert_eq!(search.results().len(), 1);

        search.on_query_change("   ");
        assert!(search.results().is_empty());

        advance(Duration::from_millis(400)).await;
        settle().await;
        // The blank keystroke issued no request and canceled nothing
        // new; only the original lookup is on record.
        assert_eq!(remote.searches().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn excludes_current_editors_and_acting_user() {
        let remote = Arc::new(FakeRemote::new());
        *remote.users.lock().unwrap() = vec![
            user(1, Role::Student),
            user(2, Role::Student),
            user(3, Role::Teacher),
            user(4, Role::Student),
        ];
        let search = engine(&remote);
        search.set_acting_user(Some(3));
        search.set_excluded_editors([1, 2]);

        search.on_query_change("user");
        advance(Duration::from_millis(301)).await;
        settle().await;

        let ids: Vec<i64> = search.results().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_clears_results_quietly() {
        let remote = Arc::new(FakeRemote::new());
        *remote.users.lock().unwrap() = vec![user(4, Role::Student)];
        let search = engine(&remote);

        search.on_query_change("user");
        advance(Duration::from_millis(301)).await;
        settle().await;
        assert_eq!(search.results().len(), 1);

        remote.fail_search.store(true, Ordering::SeqCst);
        search.on_query_change("users");
        advance(Duration::from_millis(301)).await;
        settle().await;

        assert!(search.results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_pending_lookup() {
        let remote = Arc::new(FakeRemote::new());
        let search = engine(&remote);

        search.on_query_change("late");
        search.shutdown();

        advance(Duration::from_millis(400)).await;
        settle().await;
        assert!(remote.searches().is_empty());
    }
}
