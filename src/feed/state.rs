//! Shared, synchronized list of feed items.
//!
//! The list lives behind one `RwLock` and every operation takes the lock
//! exactly once, so a reader never observes a half-applied batch. Readers get
//! an `Arc` snapshot: appending after a snapshot was handed out copies the
//! list (`Arc::make_mut`) instead of mutating what the reader holds.

use super::{FeedError, FeedItem};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Snapshot = Option<Arc<Vec<FeedItem>>>;

/// Cloneable handle to the feed list. All clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    items: Arc<RwLock<Snapshot>>,
}

impl FeedState {
    /// A new state with nothing loaded ("absent").
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, or `None` when no load has completed since startup
    /// or the last reset.
    pub fn get(&self) -> Option<Arc<Vec<FeedItem>>> {
        self.read().clone()
    }

    /// Replace the whole list with `items` and return the new snapshot.
    pub fn replace(&self, items: Vec<FeedItem>) -> Arc<Vec<FeedItem>> {
        let snapshot = Arc::new(items);
        *self.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Append `batch` after the items already held, keeping both orders.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidState`] if nothing has been loaded yet.
    pub fn append(&self, batch: &[FeedItem]) -> Result<Arc<Vec<FeedItem>>, FeedError> {
        let mut guard = self.write();
        let current = guard
            .as_mut()
            .ok_or(FeedError::InvalidState("append called before an initial load"))?;
        Arc::make_mut(current).extend_from_slice(batch);
        Ok(Arc::clone(current))
    }

    /// Drop the list and go back to "absent".
    pub fn reset(&self) {
        *self.write() = None;
    }

    /// Number of items held (0 when absent).
    pub fn len(&self) -> usize {
        self.read().as_ref().map_or(0, |items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_absent(&self) -> bool {
        self.read().is_none()
    }

    /// Timestamp of the last (oldest) item, if any.
    pub fn oldest_timestamp(&self) -> Option<i64> {
        self.read()
            .as_ref()
            .and_then(|items| items.last())
            .map(|item| item.timestamp)
    }

    // A panic inside a critical section can only come from an allocation
    // failure; the list is still whole at that point, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Author;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn item(id: i64, timestamp: i64) -> FeedItem {
        FeedItem::new(id, timestamp, Arc::new(Author::unknown()), format!("item {id}"))
    }

    fn ids(items: &[FeedItem]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_new_state_is_absent() {
        let state = FeedState::new();
        assert!(state.get().is_none());
        assert!(state.is_absent());
        assert_eq!(state.len(), 0);
        assert_eq!(state.oldest_timestamp(), None);
    }

    #[test]
    fn test_replace_discards_previous_items() {
        let state = FeedState::new();
        state.replace(vec![item(1, 10), item(2, 9)]);
        state.replace(vec![item(7, 70)]);
        assert_eq!(ids(&state.get().unwrap()), vec![7]);
    }

    #[test]
    fn test_append_keeps_existing_then_batch_order() {
        let state = FeedState::new();
        state.replace(vec![item(1, 1000), item(2, 900)]);
        let merged = state.append(&[item(3, 800), item(4, 700)]).unwrap();
        assert_eq!(ids(&merged), vec![1, 2, 3, 4]);
        assert_eq!(state.oldest_timestamp(), Some(700));
    }

    #[test]
    fn test_append_when_absent_fails() {
        let state = FeedState::new();
        let result = state.append(&[item(1, 10)]);
        assert!(matches!(result, Err(FeedError::InvalidState(_))));
        assert!(state.is_absent());
    }

    #[test]
    fn test_reset_returns_to_absent() {
        let state = FeedState::new();
        state.replace(vec![item(1, 10)]);
        state.reset();
        assert!(state.get().is_none());
        assert!(state.append(&[item(2, 5)]).is_err());
    }

    #[test]
    fn test_clones_share_the_list() {
        let state = FeedState::new();
        let other = state.clone();
        state.replace(vec![item(1, 10)]);
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_snapshot_unchanged_by_later_append() {
        let state = FeedState::new();
        state.replace(vec![item(1, 10)]);
        let before = state.get().unwrap();
        state.append(&[item(2, 5)]).unwrap();
        assert_eq!(ids(&before), vec![1]);
        assert_eq!(ids(&state.get().unwrap()), vec![1, 2]);
    }

    #[test]
    fn test_concurrent_readers_see_whole_batches() {
        const BATCH: usize = 50;
        let state = FeedState::new();
        state.replace(Vec::new());

        let writer = {
            let state = state.clone();
            std::thread::spawn(move || {
                for round in 0..40 {
                    let batch: Vec<FeedItem> = (0..BATCH)
                        .map(|i| item((round * BATCH + i) as i64, 0))
                        .collect();
                    state.append(&batch).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let len = state.get().map_or(0, |items| items.len());
                        assert_eq!(len % BATCH, 0, "observed a partial batch");
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(state.len(), 40 * BATCH);
    }

    proptest! {
        #[test]
        fn prop_appends_concatenate_in_order(
            batches in proptest::collection::vec(proptest::collection::vec(any::<i64>(), 0..8), 1..6)
        ) {
            let state = FeedState::new();
            let mut expected = Vec::new();
            for (index, batch) in batches.iter().enumerate() {
                let items: Vec<FeedItem> = batch.iter().map(|&id| item(id, 0)).collect();
                let snapshot_before = state.get();
                if index == 0 {
                    state.replace(items);
                } else {
                    state.append(&items).unwrap();
                }
                expected.extend(batch.iter().copied());
                if let Some(before) = snapshot_before {
                    prop_assert_eq!(before.len(), expected.len() - batch.len());
                }
            }
            prop_assert_eq!(ids(&state.get().unwrap()), expected);
        }
    }
}
