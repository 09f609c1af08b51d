//! Notifications from the fetch coordinator to the display consumer.
//!
//! A bounded `mpsc` queue with exactly one receiver. Events are applied in
//! the order they were sent; nothing is merged or dropped, so three appends
//! queued while the consumer was busy are applied as three appends.

use super::FeedItem;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receiver side of a display: the only code allowed to touch display state.
///
/// Both entry points are called from the single task that owns the
/// [`FeedEvents`] receiver.
pub trait DisplayConsumer {
    /// A fresh list was loaded; drop whatever was shown before.
    fn apply_created(&mut self, items: &[FeedItem]);

    /// An older page arrived; add it after what is already shown.
    fn apply_appended(&mut self, batch: &[FeedItem]);
}

/// A change to the feed list.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Initial load finished. `items` is the full new list.
    ListCreated { items: Arc<Vec<FeedItem>> },
    /// A continuation page finished. `batch` holds only the new items.
    ListAppended { batch: Vec<FeedItem> },
}

impl FeedEvent {
    /// Hand this event to the matching consumer entry point.
    pub fn apply_to<C: DisplayConsumer + ?Sized>(&self, consumer: &mut C) {
        match self {
            FeedEvent::ListCreated { items } => consumer.apply_created(items),
            FeedEvent::ListAppended { batch } => consumer.apply_appended(batch),
        }
    }

    /// Number of items carried by the event.
    pub fn len(&self) -> usize {
        match self {
            FeedEvent::ListCreated { items } => items.len(),
            FeedEvent::ListAppended { batch } => batch.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Create the notification queue. `capacity` is clamped to at least 1.
pub(crate) fn channel(capacity: usize) -> (EventSender, FeedEvents) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender { tx }, FeedEvents { rx })
}

/// Producer half, held by the coordinator's fetch tasks.
#[derive(Debug, Clone)]
pub(crate) struct EventSender {
    tx: mpsc::Sender<FeedEvent>,
}

impl EventSender {
    /// Queue an event for the consumer.
    ///
    /// Waits for room when the queue is full; this only ever parks the fetch
    /// task, never the consumer. A dropped consumer is logged, not an error.
    pub(crate) async fn send(&self, event: FeedEvent) {
        let kind = match &event {
            FeedEvent::ListCreated { .. } => "ListCreated",
            FeedEvent::ListAppended { .. } => "ListAppended",
        };
        if let Err(e) = self.tx.send(event).await {
            tracing::warn!(error = %e, event = kind, "Feed event send failed (receiver dropped)");
        }
    }
}

/// Consumer half. Owned by exactly one task.
#[derive(Debug)]
pub struct FeedEvents {
    rx: mpsc::Receiver<FeedEvent>,
}

impl FeedEvents {
    /// Wait for the next event. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<FeedEvent> {
        self.rx.try_recv().ok()
    }

    /// Apply every queued event to `consumer` without waiting.
    /// Returns how many events were applied.
    pub fn drain_into<C: DisplayConsumer + ?Sized>(&mut self, consumer: &mut C) -> usize {
        let mut applied = 0;
        while let Some(event) = self.try_recv() {
            event.apply_to(consumer);
            applied += 1;
        }
        applied
    }

    /// Apply events as they arrive until the coordinator is dropped.
    pub async fn run<C: DisplayConsumer + ?Sized>(mut self, consumer: &mut C) {
        while let Some(event) = self.recv().await {
            tracing::trace!(items = event.len(), "Applying feed event");
            event.apply_to(consumer);
        }
        tracing::debug!("Feed event channel closed");
    }
}
