//! Fetch orchestration.
//!
//! The coordinator runs at most one fetch at a time. A trigger that arrives
//! while a fetch is in flight is ignored, which also debounces bursts of
//! scroll events. Since fetches never overlap, results are applied (and
//! notifications queued) in the order the fetches were issued.
//!
//! The current phase lives in a `watch` channel. It is both the guard for
//! the idle/fetching transitions (checked and updated under the channel's
//! lock via `send_if_modified`) and the signal through which failures become
//! visible: a failed fetch leaves the feed untouched, queues no list event
//! and only records `last_error` in [`FetchStatus::Idle`].

use super::events::{self, EventSender, FeedEvents};
use super::window::span_seconds;
use super::{FeedError, FeedEvent, FeedItem, FeedState, FetchMode, FetchWindow};
use crate::source::FeedSource;
use crate::util::catch_task_panic;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Phase of a [`FetchCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// No fetch in flight. `last_error` describes the most recent failed
    /// fetch, cleared by the next successful one or by a reset.
    Idle { last_error: Option<Arc<str>> },
    /// A fetch for `window` is in flight.
    Fetching { mode: FetchMode, window: FetchWindow },
}

impl FetchStatus {
    pub fn is_fetching(&self) -> bool {
        matches!(self, FetchStatus::Fetching { .. })
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            FetchStatus::Idle { last_error } => last_error.as_deref(),
            FetchStatus::Fetching { .. } => None,
        }
    }
}

/// Result of [`FetchCoordinator::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A background fetch for this window was started.
    Started(FetchWindow),
    /// A fetch was already in flight; nothing happened.
    AlreadyFetching,
}

/// Settings for a [`FetchCoordinator`].
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorOptions {
    /// Span of every fetch window.
    pub window_span: Duration,
    /// Notifications that may queue up before a fetch task waits for the consumer.
    pub event_capacity: usize,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            window_span: super::DEFAULT_WINDOW_SPAN,
            event_capacity: 32,
        }
    }
}

struct Inner {
    source: Arc<dyn FeedSource>,
    state: FeedState,
    events: EventSender,
    status: watch::Sender<FetchStatus>,
    window_span: Duration,
    runtime: Handle,
}

/// Drives fetches and merges their results into the feed.
///
/// Cheap to clone; clones control the same feed. The paired [`FeedEvents`]
/// receiver closes once every clone is dropped and the last fetch finished.
#[derive(Clone)]
pub struct FetchCoordinator {
    inner: Arc<Inner>,
}

impl FetchCoordinator {
    /// Create a coordinator and the receiver its notifications go to.
    ///
    /// Must be called from within a Tokio runtime; fetches are spawned on it.
    /// `trigger` itself may then be called from any thread.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidWindowSpan`] if `options.window_span` is under a second
    /// - [`FeedError::NoRuntime`] outside a Tokio runtime
    pub fn new<S: FeedSource>(
        source: S,
        options: CoordinatorOptions,
    ) -> Result<(Self, FeedEvents), FeedError> {
        Self::with_shared_source(Arc::new(source), options)
    }

    /// Like [`FetchCoordinator::new`] for a source that is already shared.
    pub fn with_shared_source(
        source: Arc<dyn FeedSource>,
        options: CoordinatorOptions,
    ) -> Result<(Self, FeedEvents), FeedError> {
        span_seconds(options.window_span)?;
        let runtime = Handle::try_current().map_err(|_| FeedError::NoRuntime)?;

        let (events, receiver) = events::channel(options.event_capacity);
        let (status, _) = watch::channel(FetchStatus::Idle { last_error: None });

        let coordinator = Self {
            inner: Arc::new(Inner {
                source,
                state: FeedState::new(),
                events,
                status,
                window_span: options.window_span,
                runtime,
            }),
        };
        Ok((coordinator, receiver))
    }

    /// Start a fetch of `mode` unless one is already in flight.
    ///
    /// Never blocks: the fetch runs on the runtime and its result arrives as a
    /// [`FeedEvent`] on the consumer's receiver.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidState`] for [`FetchMode::Continuation`] while the
    /// feed holds no items. No fetch is attempted in that case.
    pub fn trigger(&self, mode: FetchMode) -> Result<TriggerOutcome, FeedError> {
        let mut outcome = Ok(TriggerOutcome::AlreadyFetching);

        self.inner.status.send_if_modified(|status| {
            if status.is_fetching() {
                return false;
            }
            let snapshot = self.inner.state.get();
            let items = snapshot.as_deref().map(Vec::as_slice);
            match FetchWindow::compute(mode, items, self.inner.window_span) {
                Ok(window) => {
                    *status = FetchStatus::Fetching { mode, window };
                    outcome = Ok(TriggerOutcome::Started(window));
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });

        match &outcome {
            Ok(TriggerOutcome::Started(window)) => {
                tracing::debug!(
                    mode = ?mode,
                    start_time = window.start_time,
                    anchor_time = window.anchor_time,
                    "Starting feed fetch"
                );
                let inner = Arc::clone(&self.inner);
                let (mode, window) = (mode, *window);
                self.inner
                    .runtime
                    .spawn(async move { inner.run_fetch(mode, window).await });
            }
            Ok(TriggerOutcome::AlreadyFetching) => {
                tracing::trace!(mode = ?mode, "Fetch already in progress, trigger ignored");
            }
            Err(e) => {
                tracing::warn!(mode = ?mode, error = %e, "Rejected fetch trigger");
            }
        }

        outcome
    }

    /// Trigger whichever fetch comes next: the initial load if nothing is
    /// loaded, otherwise the next older page.
    pub fn trigger_next(&self) -> Result<TriggerOutcome, FeedError> {
        self.trigger(FetchMode::next_for(&self.inner.state))
    }

    /// Drop the loaded feed so the next trigger starts from scratch.
    ///
    /// # Errors
    ///
    /// [`FeedError::ConcurrentReset`] while a fetch is in flight; wait for
    /// [`FetchCoordinator::settled`] and retry.
    pub fn reset(&self) -> Result<(), FeedError> {
        let mut result = Ok(());

        self.inner.status.send_if_modified(|status| {
            if status.is_fetching() {
                result = Err(FeedError::ConcurrentReset);
                return false;
            }
            self.inner.state.reset();
            let had_error = status.last_error().is_some();
            *status = FetchStatus::Idle { last_error: None };
            had_error
        });

        match &result {
            Ok(()) => tracing::debug!("Feed reset"),
            Err(e) => tracing::warn!(error = %e, "Rejected feed reset"),
        }
        result
    }

    /// Reset, then load the first page again.
    pub fn refresh(&self) -> Result<TriggerOutcome, FeedError> {
        self.reset()?;
        self.trigger(FetchMode::Initial)
    }

    /// Current phase.
    pub fn status(&self) -> FetchStatus {
        self.inner.status.borrow().clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.status.borrow().is_fetching()
    }

    /// Receiver that observes every phase change.
    pub fn subscribe(&self) -> watch::Receiver<FetchStatus> {
        self.inner.status.subscribe()
    }

    /// Wait until no fetch is in flight and return the idle status.
    pub async fn settled(&self) -> FetchStatus {
        let mut rx = self.inner.status.subscribe();
        let settled = rx.wait_for(|status| !status.is_fetching()).await;
        match settled {
            Ok(status) => status.clone(),
            // The sender lives in `inner`, which we hold.
            Err(_) => self.status(),
        }
    }

    /// Read-only snapshot of the merged feed (`None` before the first load).
    pub fn snapshot(&self) -> Option<Arc<Vec<FeedItem>>> {
        self.inner.state.get()
    }

    /// Number of items in the merged feed.
    pub fn len(&self) -> usize {
        self.inner.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.is_empty()
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl Inner {
    async fn run_fetch(&self, mode: FetchMode, window: FetchWindow) {
        let started = Instant::now();

        let last_error = match catch_task_panic(self.source.fetch(window)).await {
            Ok(Ok(batch)) => match self.apply(mode, batch).await {
                Ok(count) => {
                    tracing::info!(
                        mode = ?mode,
                        items = count,
                        total = self.state.len(),
                        elapsed_ms = millis(started.elapsed()),
                        "Feed page loaded"
                    );
                    None
                }
                Err(e) => {
                    tracing::error!(mode = ?mode, error = %e, "Could not merge fetched page");
                    Some(e.to_string())
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(
                    mode = ?mode,
                    error = %e,
                    network = e.is_network(),
                    start_time = window.start_time,
                    anchor_time = window.anchor_time,
                    "Feed fetch failed, keeping current feed"
                );
                Some(e.to_string())
            }
            Err(panic_msg) => {
                tracing::error!(task = "fetch", error = %panic_msg, "Background task panicked");
                Some(format!("Feed source panicked: {panic_msg}"))
            }
        };

        // Events for this fetch are queued before the phase flips back, so a
        // trigger that wins the next slot can only enqueue after them.
        self.status.send_replace(FetchStatus::Idle {
            last_error: last_error.map(Arc::from),
        });
    }

    /// Merge a fetched batch and notify the consumer. Returns the batch size.
    async fn apply(&self, mode: FetchMode, batch: Vec<FeedItem>) -> Result<usize, FeedError> {
        let count = batch.len();
        let event = match mode {
            FetchMode::Initial => FeedEvent::ListCreated {
                items: self.state.replace(batch),
            },
            FetchMode::Continuation => {
                self.state.append(&batch)?;
                FeedEvent::ListAppended { batch }
            }
        };
        self.events.send(event).await;
        Ok(count)
    }
}
