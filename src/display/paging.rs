//! Sequential paging: load the first page, then a fixed number of older ones.

use super::DisplayList;
use crate::feed::{
    FeedError, FeedEvents, FeedItem, FetchCoordinator, FetchMode, FetchWindow, TriggerOutcome,
};
use std::sync::Arc;

/// Settings for [`page_back`].
#[derive(Debug, Clone, Copy)]
pub struct PagingOptions {
    /// Older pages to load after the first one.
    pub pages: usize,
}

/// Why [`page_back`] stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagingEnd {
    /// Every requested page was loaded.
    PagesDone,
    /// A page came back empty; there is nothing older.
    Exhausted,
    /// A fetch failed. Items loaded before it are kept.
    Failed(Arc<str>),
}

/// Load the first page and then up to `options.pages` older pages into
/// `list`, handing every batch of new rows to `on_rows`.
///
/// Each page is applied only after its fetch has settled, and a trigger that
/// lands while a fetch is still finishing is retried once the coordinator is
/// idle.
///
/// # Errors
///
/// Returns [`FeedError`] when the coordinator rejects a trigger.
pub async fn page_back<F>(
    coordinator: &FetchCoordinator,
    events: &mut FeedEvents,
    list: &mut DisplayList,
    options: PagingOptions,
    mut on_rows: F,
) -> Result<PagingEnd, FeedError>
where
    F: FnMut(&[FeedItem]),
{
    let mut pages_left = options.pages;
    let mut mode = FetchMode::Initial;

    loop {
        let window = start_fetch(coordinator, mode).await?;
        let status = coordinator.settled().await;
        if let Some(error) = status.last_error() {
            tracing::warn!(mode = ?mode, error = %error, "Paging stopped by failed fetch");
            return Ok(PagingEnd::Failed(Arc::from(error)));
        }

        // Events are queued before the coordinator reports idle.
        let mut last_len = None;
        while let Some(event) = events.try_recv() {
            event.apply_to(list);
            last_len = Some(event.len());
        }
        on_rows(list.take_new());
        tracing::debug!(
            anchor_time = window.anchor_time,
            items = last_len.unwrap_or(0),
            total = list.count(),
            "Page applied"
        );

        if last_len.unwrap_or(0) == 0 {
            return Ok(PagingEnd::Exhausted);
        }
        if pages_left == 0 {
            return Ok(PagingEnd::PagesDone);
        }
        pages_left -= 1;
        mode = FetchMode::Continuation;
    }
}

/// Trigger `mode`, waiting out any fetch that is still in flight.
async fn start_fetch(
    coordinator: &FetchCoordinator,
    mode: FetchMode,
) -> Result<FetchWindow, FeedError> {
    loop {
        match coordinator.trigger(mode)? {
            TriggerOutcome::Started(window) => return Ok(window),
            TriggerOutcome::AlreadyFetching => {
                tracing::trace!(mode = ?mode, "Fetch in flight, retrying once idle");
                coordinator.settled().await;
            }
        }
    }
}
