//! Fetch window calculation.
//!
//! Every fetch asks the remote service for one window of time ending at an
//! anchor. The first page is anchored at "now"; each following page is
//! anchored at the oldest item already held, so pages walk back in time.

use super::{FeedError, FeedItem, FeedState};
use chrono::Utc;
use std::time::Duration;

/// Default span of one fetch window (30 days).
pub const DEFAULT_WINDOW_SPAN: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Which kind of page a fetch loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// First page: replaces whatever the state held.
    Initial,
    /// Next older page: appended after the items already held.
    Continuation,
}

impl FetchMode {
    /// The mode the next fetch should use given the current state.
    ///
    /// Nothing loaded yet means the next fetch is the initial one.
    pub fn next_for(state: &FeedState) -> Self {
        match state.get() {
            Some(items) if !items.is_empty() => FetchMode::Continuation,
            _ => FetchMode::Initial,
        }
    }
}

/// Time range `[start_time, anchor_time)` of one fetch, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub anchor_time: i64,
    pub start_time: i64,
}

impl FetchWindow {
    /// Compute the window for `mode` using the current wall clock.
    ///
    /// `items` is the current state snapshot (`None` = nothing loaded yet).
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidWindowSpan`] if `span` is shorter than one second
    /// - [`FeedError::InvalidState`] for a continuation with no items held, or
    ///   when the anchor is too close to `i64::MIN` to fit a whole window
    pub fn compute(
        mode: FetchMode,
        items: Option<&[FeedItem]>,
        span: Duration,
    ) -> Result<Self, FeedError> {
        Self::compute_at(mode, items, span, Utc::now().timestamp())
    }

    /// Same as [`FetchWindow::compute`] with an explicit "now".
    pub fn compute_at(
        mode: FetchMode,
        items: Option<&[FeedItem]>,
        span: Duration,
        now: i64,
    ) -> Result<Self, FeedError> {
        let span_secs = span_seconds(span)?;

        let anchor_time = match mode {
            FetchMode::Initial => now,
            // Newest-first ordering: the oldest item is the last one.
            FetchMode::Continuation => items
                .and_then(|items| items.last())
                .map(|oldest| oldest.timestamp)
                .ok_or(FeedError::InvalidState(
                    "continuation requested before any items were loaded",
                ))?,
        };

        let start_time = anchor_time
            .checked_sub(span_secs)
            .ok_or(FeedError::InvalidState(
                "fetch window would start before the earliest representable time",
            ))?;

        Ok(Self {
            anchor_time,
            start_time,
        })
    }
}

/// Whole seconds in `span`, rejecting spans that would produce an empty window.
pub(crate) fn span_seconds(span: Duration) -> Result<i64, FeedError> {
    match i64::try_from(span.as_secs()) {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(FeedError::InvalidWindowSpan(span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Author;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn item(id: i64, timestamp: i64) -> FeedItem {
        FeedItem::new(id, timestamp, Arc::new(Author::unknown()), "")
    }

    #[test]
    fn test_initial_window_anchored_at_now() {
        let window =
            FetchWindow::compute_at(FetchMode::Initial, None, DEFAULT_WINDOW_SPAN, 10_000_000)
                .unwrap();
        assert_eq!(window.anchor_time, 10_000_000);
        assert_eq!(window.start_time, 10_000_000 - 2_592_000);
    }

    #[test]
    fn test_initial_ignores_held_items() {
        let items = vec![item(1, 500)];
        let window = FetchWindow::compute_at(
            FetchMode::Initial,
            Some(&items),
            Duration::from_secs(100),
            9_000,
        )
        .unwrap();
        assert_eq!(window.anchor_time, 9_000);
    }

    #[test]
    fn test_continuation_anchored_at_oldest_item() {
        let items = vec![item(1, 1000), item(2, 900)];
        let window = FetchWindow::compute_at(
            FetchMode::Continuation,
            Some(&items),
            Duration::from_secs(100),
            5_000,
        )
        .unwrap();
        assert_eq!(
            window,
            FetchWindow {
                anchor_time: 900,
                start_time: 800
            }
        );
    }

    #[test]
    fn test_continuation_without_items_is_invalid() {
        let absent = FetchWindow::compute_at(FetchMode::Continuation, None, DEFAULT_WINDOW_SPAN, 0);
        assert!(matches!(absent, Err(FeedError::InvalidState(_))));

        let empty =
            FetchWindow::compute_at(FetchMode::Continuation, Some(&[]), DEFAULT_WINDOW_SPAN, 0);
        assert!(matches!(empty, Err(FeedError::InvalidState(_))));
    }

    #[test]
    fn test_anchor_near_minimum_is_invalid() {
        let items = vec![item(1, i64::MIN + 10)];
        let result = FetchWindow::compute_at(
            FetchMode::Continuation,
            Some(&items),
            Duration::from_secs(100),
            0,
        );
        assert!(matches!(result, Err(FeedError::InvalidState(_))));

        let items = vec![item(1, i64::MIN + 100)];
        let window = FetchWindow::compute_at(
            FetchMode::Continuation,
            Some(&items),
            Duration::from_secs(100),
            0,
        )
        .unwrap();
        assert_eq!(window.start_time, i64::MIN);
        assert!(window.start_time < window.anchor_time);
    }

    #[test]
    fn test_sub_second_span_rejected() {
        let result =
            FetchWindow::compute_at(FetchMode::Initial, None, Duration::from_millis(999), 100);
        assert!(matches!(result, Err(FeedError::InvalidWindowSpan(_))));
    }

    #[test]
    fn test_next_mode_follows_state() {
        let state = FeedState::new();
        assert_eq!(FetchMode::next_for(&state), FetchMode::Initial);

        state.replace(Vec::new());
        assert_eq!(FetchMode::next_for(&state), FetchMode::Initial);

        state.replace(vec![item(1, 10)]);
        assert_eq!(FetchMode::next_for(&state), FetchMode::Continuation);
    }

    proptest! {
        #[test]
        fn prop_window_start_precedes_anchor(
            now in -1_000_000_000i64..4_000_000_000i64,
            span in 1u64..100_000_000u64,
        ) {
            let window = FetchWindow::compute_at(
                FetchMode::Initial,
                None,
                Duration::from_secs(span),
                now,
            ).unwrap();
            prop_assert!(window.start_time < window.anchor_time);
            prop_assert_eq!(window.anchor_time - window.start_time, span as i64);
        }
    }
}
