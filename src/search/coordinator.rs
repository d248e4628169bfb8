//! Search coordinator
//!
//! Turns keystrokes into at most one in-flight backend search. Each query
//! change restarts a debounce timer; when it fires, or on an explicit
//! submit, the previous search task is cancelled before a new one starts,
//! so only the newest request can ever write [`SearchState`].

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::{ApiError, QuarryApi};
use crate::config::SearchConfig;
use crate::types::SearchResponse;

use super::state::SearchState;

/// Debounced, cancellable search over a [`QuarryApi`].
///
/// All methods that schedule work must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct SearchCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn QuarryApi>,
    config: SearchConfig,
    query: Mutex<String>,
    collection: Mutex<Option<String>>,
    tasks: Mutex<Tasks>,
    state: watch::Sender<SearchState>,
}

/// Outstanding task handles.
///
/// `generation` advances whenever the current search is cancelled; a
/// completing search applies its result only if its generation is current.
/// `debounce_generation` does the same for the debounce timer, so a timer
/// that fires after being superseded starts nothing.
#[derive(Default)]
struct Tasks {
    debounce: Option<JoinHandle<()>>,
    search: Option<JoinHandle<()>>,
    generation: u64,
    debounce_generation: u64,
}

impl Tasks {
    fn cancel_debounce(&mut self) {
        if let Some(debounce) = self.debounce.take() {
            debounce.abort();
        }
        self.debounce_generation += 1;
    }

    fn cancel_search(&mut self) {
        if let Some(search) = self.search.take() {
            search.abort();
        }
        self.generation += 1;
    }
}

impl SearchCoordinator {
    pub fn new(api: Arc<dyn QuarryApi>, config: SearchConfig) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            inner: Arc::new(Inner {
                api,
                config,
                query: Mutex::new(String::new()),
                collection: Mutex::new(None),
                tasks: Mutex::new(Tasks::default()),
                state,
            }),
        }
    }

    pub fn query(&self) -> String {
        self.inner.query.lock().clone()
    }

    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    pub fn collection(&self) -> Option<String> {
        self.inner.collection.lock().clone()
    }

    /// Restrict later searches to one collection (`None` searches all)
    pub fn set_collection(&self, collection: Option<String>) {
        *self.inner.collection.lock() = collection;
    }

    /// Replace the query and (re)start the debounce timer.
    ///
    /// A blank query skips the debounce: the in-flight search is cancelled
    /// and the state becomes `Idle` immediately.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let blank = query.trim().is_empty();

        let mut tasks = self.inner.tasks.lock();
        *self.inner.query.lock() = query;
        tasks.cancel_debounce();

        if blank {
            tasks.cancel_search();
            self.inner.set_state(SearchState::Idle);
            return;
        }

        let delay = self.inner.config.debounce();
        let debounce_generation = tasks.debounce_generation;
        let weak = Arc::downgrade(&self.inner);
        tasks.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.debounce_elapsed(debounce_generation);
            }
        }));
    }

    /// Search for the current query now, bypassing the debounce
    pub fn search(&self) {
        let mut tasks = self.inner.tasks.lock();
        tasks.cancel_debounce();
        self.inner.start_search(&mut tasks);
    }

    /// Search for the current query now and wait for its outcome.
    ///
    /// Supersedes both a pending debounce and whatever is on screen, so the
    /// returned state always belongs to the current query.
    pub async fn search_and_wait(&self) -> SearchState {
        let mut states = self.subscribe();
        self.search();
        let outcome = match states.wait_for(|s| !s.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        outcome
    }

    /// Reset to an empty query and `Idle`, cancelling all pending work
    pub fn clear(&self) {
        let mut tasks = self.inner.tasks.lock();
        self.inner.query.lock().clear();
        tasks.cancel_debounce();
        tasks.cancel_search();
        self.inner.set_state(SearchState::Idle);
    }
}

impl Inner {
    /// Replace the state, notifying subscribers only on a visible change
    fn set_state(&self, next: SearchState) {
        self.state.send_if_modified(|current| {
            let changed = *current != next;
            *current = next;
            changed
        });
    }

    /// Timer of `debounce_generation` fired; ignored once superseded
    fn debounce_elapsed(self: &Arc<Self>, debounce_generation: u64) {
        let mut tasks = self.tasks.lock();
        if tasks.debounce_generation != debounce_generation {
            debug!("Ignoring superseded debounce timer");
            return;
        }
        tasks.debounce = None;
        self.start_search(&mut tasks);
    }

    /// Cancel the current search and start one for the current query.
    ///
    /// Runs under the `tasks` lock, which also orders every query change.
    fn start_search(self: &Arc<Self>, tasks: &mut Tasks) {
        let query = self.query.lock().trim().to_string();
        tasks.cancel_search();

        if query.is_empty() {
            self.set_state(SearchState::Idle);
            return;
        }

        let generation = tasks.generation;
        let collection = self.collection.lock().clone();
        let limit = self.config.result_limit;
        let api = Arc::clone(&self.api);
        let weak = Arc::downgrade(self);

        self.set_state(SearchState::Loading);
        debug!("Searching for '{}' (generation {})", query, generation);

        tasks.search = Some(tokio::spawn(async move {
            let result = api.search(&query, limit, collection.as_deref()).await;
            apply_result(weak, generation, &query, result);
        }));
    }
}

fn apply_result(
    inner: Weak<Inner>,
    generation: u64,
    query: &str,
    result: Result<SearchResponse, ApiError>,
) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    let tasks = inner.tasks.lock();
    if tasks.generation != generation {
        debug!("Discarding superseded results for '{}'", query);
        return;
    }

    let next = match result {
        Ok(response) if response.results.is_empty() => SearchState::Empty(query.to_string()),
        Ok(response) => {
            debug!("{} results for '{}'", response.results.len(), query);
            SearchState::Results(response.results)
        }
        Err(e) => {
            warn!("Search for '{}' failed: {}", query, e);
            SearchState::Error(e.to_string())
        }
    };
    inner.set_state(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CollectionsResponse, DocumentsResponse, HealthResponse, SearchResult, StatusResponse,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    type Outcome = Result<Vec<SearchResult>, ApiError>;

    /// Backend fake: per-query delay and results, records every call
    struct FakeBackend {
        delay_for: fn(&str) -> Duration,
        results_for: fn(&str) -> Outcome,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl FakeBackend {
        fn new(delay_for: fn(&str) -> Duration, results_for: fn(&str) -> Outcome) -> Arc<Self> {
            Arc::new(Self {
                delay_for,
                results_for,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<String> {
            self.calls.lock().iter().map(|(q, _)| q.clone()).collect()
        }
    }

    #[async_trait]
    impl QuarryApi for FakeBackend {
        async fn health(&self) -> Result<HealthResponse, ApiError> {
            Err(ApiError::ServerNotRunning)
        }

        async fn search(
            &self,
            query: &str,
            _limit: usize,
            collection: Option<&str>,
        ) -> Result<SearchResponse, ApiError> {
            self.calls
                .lock()
                .push((query.to_string(), collection.map(str::to_string)));
            tokio::time::sleep((self.delay_for)(query)).await;
            let results = (self.results_for)(query)?;
            Ok(SearchResponse {
                query: query.to_string(),
                total_results: results.len(),
                results,
            })
        }

        async fn documents(&self, _collection: Option<&str>) -> Result<DocumentsResponse, ApiError> {
            Err(ApiError::ServerNotRunning)
        }

        async fn collections(&self) -> Result<CollectionsResponse, ApiError> {
            Err(ApiError::ServerNotRunning)
        }

        async fn status(&self) -> Result<StatusResponse, ApiError> {
            Err(ApiError::ServerNotRunning)
        }
    }

    fn hit(document_name: &str) -> SearchResult {
        SearchResult {
            document_name: document_name.to_string(),
            collection: "default".to_string(),
            page_number: 1,
            chunk_index: 0,
            text: format!("about {}", document_name),
            page_type: "text".to_string(),
            source_format: ".md".to_string(),
            similarity: 0.8,
        }
    }

    fn echo(query: &str) -> Outcome {
        Ok(vec![hit(&format!("{}.md", query))])
    }

    fn quick(_query: &str) -> Duration {
        Duration::from_millis(10)
    }

    fn coordinator(api: Arc<FakeBackend>) -> SearchCoordinator {
        SearchCoordinator::new(api, SearchConfig::default())
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_issues_one_search() {
        let api = FakeBackend::new(quick, echo);
        let search = coordinator(api.clone());

        for prefix in ["a", "al", "alp", "alph"] {
            search.set_query(prefix);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        search.set_query("alpha");
        settle().await;

        assert_eq!(api.queries(), vec!["alpha"]);
        assert_eq!(search.state(), SearchState::Results(vec![hit("alpha.md")]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_waits_for_quiet_period() {
        let api = FakeBackend::new(quick, echo);
        let search = coordinator(api.clone());

        search.set_query("rust");
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(api.queries().is_empty());
        assert_eq!(search.state(), SearchState::Idle);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(api.queries(), vec!["rust"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_is_immediately_idle() {
        let api = FakeBackend::new(|_| Duration::from_millis(500), echo);
        let search = coordinator(api.clone());

        search.set_query("slow");
        search.search();
        assert_eq!(search.state(), SearchState::Loading);
        tokio::time::sleep(Duration::from_millis(10)).await;

        search.set_query("   ");
        assert_eq!(search.state(), SearchState::Idle);

        settle().await;
        assert_eq!(search.state(), SearchState::Idle);
        assert_eq!(api.queries(), vec!["slow"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_search_wins_over_slower_older_one() {
        fn delay(query: &str) -> Duration {
            if query == "alpha" {
                Duration::from_millis(500)
            } else {
                Duration::from_millis(50)
            }
        }
        let api = FakeBackend::new(delay, echo);
        let search = coordinator(api.clone());
        let mut rx = search.subscribe();

        search.set_query("alpha");
        search.search();
        tokio::time::sleep(Duration::from_millis(10)).await;

        search.set_query("beta");
        search.search();
        settle().await;

        assert_eq!(api.queries(), vec!["alpha", "beta"]);
        assert_eq!(search.state(), SearchState::Results(vec![hit("beta.md")]));
        assert_eq!(rx.borrow_and_update().result_ids(), vec![hit("beta.md").id()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_results_reports_trimmed_query() {
        let api = FakeBackend::new(quick, |_| Ok(Vec::new()));
        let search = coordinator(api);

        search.set_query("  nothing here  ");
        search.search();
        settle().await;

        assert_eq!(search.state(), SearchState::Empty("nothing here".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_error_is_shown() {
        let api = FakeBackend::new(quick, |_| {
            Err(ApiError::Http {
                status: 500,
                message: "index corrupted".to_string(),
            })
        });
        let search = coordinator(api);

        search.set_query("anything");
        settle().await;

        assert_eq!(
            search.state(),
            SearchState::Error("HTTP 500: index corrupted".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_is_idempotent() {
        let api = FakeBackend::new(|_| Duration::from_millis(500), echo);
        let search = coordinator(api);

        search.set_query("pending");
        search.search();
        search.clear();
        assert_eq!(search.query(), "");
        assert_eq!(search.state(), SearchState::Idle);

        search.clear();
        assert_eq!(search.query(), "");
        assert_eq!(search.state(), SearchState::Idle);

        settle().await;
        assert_eq!(search.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_search_cancels_pending_debounce() {
        let api = FakeBackend::new(quick, echo);
        let search = coordinator(api.clone());

        search.set_query("now");
        search.search();
        settle().await;

        assert_eq!(api.queries(), vec!["now"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collection_filter_is_forwarded() {
        let api = FakeBackend::new(quick, echo);
        let search = coordinator(api.clone());

        search.set_collection(Some("papers".to_string()));
        search.set_query("graphs");
        search.search();
        settle().await;

        let calls = api.calls.lock().clone();
        assert_eq!(calls, vec![("graphs".to_string(), Some("papers".to_string()))]);
        assert_eq!(search.collection().as_deref(), Some("papers"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_and_wait_reports_current_query() {
        let api = FakeBackend::new(quick, echo);
        let search = coordinator(api.clone());

        search.set_query("alpha");
        settle().await;
        assert_eq!(search.state().result_ids(), vec![hit("alpha.md").id()]);

        // Next query still inside its debounce window
        search.set_query("beta");
        let state = search.search_and_wait().await;

        assert_eq!(state.result_ids(), vec![hit("beta.md").id()]);
        assert_eq!(api.queries(), vec!["alpha", "beta"]);

        settle().await;
        assert_eq!(api.queries(), vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_search_and_wait_with_blank_query_is_idle() {
        let api = FakeBackend::new(quick, echo);
        let search = coordinator(api.clone());
        search.set_query("   ");
        assert_eq!(search.search_and_wait().await, SearchState::Idle);
        assert!(api.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_debounce_timer_starts_nothing() {
        let api = FakeBackend::new(quick, echo);
        let search = coordinator(api.clone());

        search.set_query("alpha");
        let stale = search.inner.tasks.lock().debounce_generation;
        search.set_query("beta");

        // A timer that fired just as the query changed
        search.inner.debounce_elapsed(stale);
        assert_eq!(search.state(), SearchState::Idle);

        settle().await;
        assert_eq!(api.queries(), vec!["beta"]);
    }

    #[tokio::test]
    async fn test_search_with_blank_query_does_nothing() {
        let api = FakeBackend::new(quick, echo);
        let search = coordinator(api.clone());
        search.search();
        assert_eq!(search.state(), SearchState::Idle);
        assert!(api.queries().is_empty());
    }
}
