use crate::client::policy::{CooldownPolicy, DebounceTimer, DedupePolicy};
use crate::client::traits::{HistoryBinding, SearchBackend};
use crate::client::url_state::{clean, write_to_url, SearchKey};
use crate::config::ClientConfig;
use crate::models::SearchResults;
use crate::search::error::SearchError;
use crate::search::types::RawParams;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Pending,
    Fulfilled,
    Failed,
}

/// Completion of one issued search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Fulfilled {
        params: RawParams,
        results: SearchResults,
    },
    Failed {
        params: RawParams,
        message: String,
    },
    /// Superseded or cancelled; not an error and never shown to the user
    Cancelled { params: RawParams },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    User,
    /// Back/forward navigation; the URL already reflects these params
    History,
}

struct InFlight {
    generation: u64,
    cancel: oneshot::Sender<()>,
}

struct Inner {
    state: ControllerState,
    generation: u64,
    in_flight: Option<InFlight>,
    dedupe: DedupePolicy,
    cooldown: CooldownPolicy,
    debounce: DebounceTimer,
}

struct Shared {
    backend: Arc<dyn SearchBackend>,
    history: Arc<dyn HistoryBinding>,
    events: mpsc::UnboundedSender<SearchEvent>,
    debounce: Duration,
    inner: Mutex<Inner>,
}

/// Caller-side coordinator of searches.
///
/// At most one search is in flight; issuing another cancels it. Identical
/// searches are suppressed while the previous one is pending or within the
/// cooldown after it completes. Typed input is debounced. Results arrive on
/// the event channel returned by [`ClientSearchController::new`].
///
/// All methods must be called from within a tokio runtime.
#[derive(Clone)]
pub struct ClientSearchController {
    shared: Arc<Shared>,
}

impl ClientSearchController {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        history: Arc<dyn HistoryBinding>,
        settings: &ClientConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SearchEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = Inner {
            state: ControllerState::Idle,
            generation: 0,
            in_flight: None,
            dedupe: DedupePolicy::default(),
            cooldown: CooldownPolicy::new(Duration::from_millis(settings.cooldown_ms)),
            debounce: DebounceTimer::default(),
        };

        let controller = Self {
            shared: Arc::new(Shared {
                backend,
                history,
                events,
                debounce: Duration::from_millis(settings.debounce_ms),
                inner: Mutex::new(inner),
            }),
        };
        (controller, receiver)
    }

    pub fn state(&self) -> ControllerState {
        self.shared.inner.lock().state
    }

    /// Search right away (dropdowns, multiselects, the search button).
    ///
    /// Returns false when suppressed as a duplicate.
    pub fn search_now(&self, params: RawParams) -> bool {
        self.shared.inner.lock().debounce.cancel();
        self.issue(params, Origin::User)
    }

    /// Typed input changed; search once input has been quiet for the
    /// debounce period
    pub fn input_changed(&self, params: RawParams) {
        let mut inner = self.shared.inner.lock();
        let generation = inner.debounce.restart();
        let controller = self.clone();
        let delay = self.shared.debounce;

        inner.debounce.arm(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let due = controller.shared.inner.lock().debounce.fire(generation);
            if due {
                controller.issue(params, Origin::User);
            }
        }));
    }

    /// Replay parameters restored by back/forward navigation without
    /// rewriting the URL
    pub fn history_navigated(&self, params: RawParams) -> bool {
        self.shared.inner.lock().debounce.cancel();
        self.issue(params, Origin::History)
    }

    /// Cancel the pending search and any armed debounce timer
    pub fn cancel(&self) {
        let mut inner = self.shared.inner.lock();
        inner.debounce.cancel();
        if let Some(in_flight) = inner.in_flight.take() {
            let _ = in_flight.cancel.send(());
            inner.cooldown.abandon();
            inner.dedupe.reset();
            inner.state = ControllerState::Idle;
        }
    }

    fn issue(&self, params: RawParams, origin: Origin) -> bool {
        let params = clean(&params);
        let key = SearchKey::of(&params);

        let mut inner = self.shared.inner.lock();
        if inner.dedupe.is_duplicate(&key) && inner.cooldown.is_active(Instant::now()) {
            debug!("Duplicate search suppressed: {}", key);
            return false;
        }

        if let Some(previous) = inner.in_flight.take() {
            debug!("Cancelling superseded search #{}", previous.generation);
            let _ = previous.cancel.send(());
        }

        inner.generation += 1;
        let generation = inner.generation;
        let (cancel, cancelled) = oneshot::channel();
        inner.in_flight = Some(InFlight { generation, cancel });
        inner.dedupe.record(key);
        inner.cooldown.start();
        inner.state = ControllerState::Pending;
        drop(inner);

        info!("Issuing search #{}", generation);
        let shared = self.shared.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancelled => Err(SearchError::Cancelled),
                result = shared.backend.search(params.clone()) => result,
            };
            shared.complete(generation, origin, params, outcome);
        });
        true
    }
}

impl Shared {
    fn complete(
        &self,
        generation: u64,
        origin: Origin,
        params: RawParams,
        outcome: Result<SearchResults, SearchError>,
    ) {
        let mut inner = self.inner.lock();
        let current = inner
            .in_flight
            .as_ref()
            .map(|f| f.generation == generation)
            .unwrap_or(false);

        if !current {
            drop(inner);
            debug!("Search #{} cancelled", generation);
            let _ = self.events.send(SearchEvent::Cancelled { params });
            return;
        }

        inner.in_flight = None;
        match outcome {
            Ok(results) => {
                inner.cooldown.finish(Instant::now());
                inner.state = ControllerState::Fulfilled;
                drop(inner);

                if origin == Origin::User {
                    let url = write_to_url(&self.history.current_url(), &params);
                    self.history.replace_state(url, &params);
                }
                info!("Search #{} fulfilled with {} listings", generation, results.count);
                let _ = self.events.send(SearchEvent::Fulfilled { params, results });
            }
            Err(err) if err.is_cancelled() => {
                inner.cooldown.abandon();
                inner.dedupe.reset();
                inner.state = ControllerState::Idle;
                drop(inner);
                let _ = self.events.send(SearchEvent::Cancelled { params });
            }
            Err(err) => {
                // a failed search may be retried with the same params at once
                inner.cooldown.abandon();
                inner.dedupe.reset();
                inner.state = ControllerState::Failed;
                drop(inner);

                info!("Search #{} failed: {}", generation, err);
                let message = err
                    .user_message()
                    .unwrap_or_else(|| "Search failed. Please try again.".to_string());
                let _ = self.events.send(SearchEvent::Failed { params, message });
            }
        }
    }
}
