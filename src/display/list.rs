use super::format_time_ago;
use crate::feed::{DisplayConsumer, FeedItem};
use crate::util::{single_line, truncate_to_width};

/// Display-side copy of the feed.
///
/// Owned by the consumer task and only changed through [`DisplayConsumer`],
/// i.e. by applying notifications in order. It never reads the shared
/// feed state directly.
#[derive(Debug, Default)]
pub struct DisplayList {
    items: Vec<FeedItem>,
    /// Running item count, updated after every applied notification.
    count: usize,
    /// How many leading items have already been handed out by `take_new`.
    shown: usize,
    /// Notifications applied so far.
    applied: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Items that arrived since the previous call. A new list
    /// (`apply_created`) starts over from the first item.
    pub fn take_new(&mut self) -> &[FeedItem] {
        let start = self.shown.min(self.items.len());
        self.shown = self.items.len();
        &self.items[start..]
    }

    /// Whether a scroll position reaches the end of the list, so the next
    /// older page should be requested.
    ///
    /// `first_visible` is the index of the first row on screen and
    /// `visible_count` how many rows fit. An empty list never asks for more:
    /// the initial load is not a scroll-driven fetch.
    pub fn should_load_more(&self, first_visible: usize, visible_count: usize) -> bool {
        self.count != 0 && first_visible.saturating_add(visible_count) >= self.count
    }
}

impl DisplayConsumer for DisplayList {
    fn apply_created(&mut self, items: &[FeedItem]) {
        self.items = items.to_vec();
        self.count = self.items.len();
        self.shown = 0;
        self.applied += 1;
    }

    fn apply_appended(&mut self, batch: &[FeedItem]) {
        self.items.extend_from_slice(batch);
        self.count = self.items.len();
        self.applied += 1;
    }
}

/// One printable row: `Author Name · 3 hours ago · post text`.
///
/// `now` is the current time in epoch seconds; the result fits in `width`
/// terminal columns.
pub fn render_row(item: &FeedItem, now: i64, width: usize) -> String {
    let author = item.author.display_name();
    let age = format_time_ago(now.saturating_sub(item.timestamp));
    let body = single_line(&item.body);

    let row = if body.is_empty() {
        format!("{author} · {age}")
    } else {
        format!("{author} · {age} · {body}")
    };
    truncate_to_width(&row, width).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Author, FeedEvent};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn item(id: i64, timestamp: i64, body: &str) -> FeedItem {
        FeedItem::new(id, timestamp, Arc::new(Author::new("Ivan", "Petrov")), body)
    }

    fn ids(items: &[FeedItem]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_created_replaces_and_appended_extends() {
        let mut list = DisplayList::new();
        list.apply_appended(&[item(9, 0, "")]);
        list.apply_created(&[item(1, 1000, ""), item(2, 900, "")]);
        assert_eq!(ids(list.items()), vec![1, 2]);

        list.apply_appended(&[item(3, 800, "")]);
        assert_eq!(ids(list.items()), vec![1, 2, 3]);
        assert_eq!(list.count(), 3);
        assert_eq!(list.applied(), 3);
    }

    #[test]
    fn test_apply_through_events() {
        let mut list = DisplayList::new();
        FeedEvent::ListCreated {
            items: Arc::new(vec![item(1, 10, "")]),
        }
        .apply_to(&mut list);
        FeedEvent::ListAppended {
            batch: vec![item(2, 5, "")],
        }
        .apply_to(&mut list);
        assert_eq!(ids(list.items()), vec![1, 2]);
    }

    #[test]
    fn test_take_new_returns_each_item_once() {
        let mut list = DisplayList::new();
        list.apply_created(&[item(1, 10, ""), item(2, 9, "")]);
        assert_eq!(ids(list.take_new()), vec![1, 2]);
        assert!(list.take_new().is_empty());

        list.apply_appended(&[item(3, 8, "")]);
        assert_eq!(ids(list.take_new()), vec![3]);

        list.apply_created(&[item(7, 70, "")]);
        assert_eq!(ids(list.take_new()), vec![7]);
    }

    #[test]
    fn test_should_load_more_at_end_of_list() {
        let mut list = DisplayList::new();
        assert!(!list.should_load_more(0, 10));

        list.apply_created(&(0..20).map(|i| item(i, 100 - i, "")).collect::<Vec<_>>());
        assert!(!list.should_load_more(0, 10));
        assert!(!list.should_load_more(9, 10));
        assert!(list.should_load_more(10, 10));
        assert!(list.should_load_more(15, 10));
    }

    #[test]
    fn test_render_row() {
        let now = 10_000;
        let row = render_row(&item(1, now - 7200, "Hello\nworld"), now, 80);
        assert_eq!(row, "Ivan Petrov · 2 hours ago · Hello world");

        let empty = render_row(&item(1, now, "  "), now, 80);
        assert_eq!(empty, "Ivan Petrov · just now");
    }

    #[test]
    fn test_render_row_truncates() {
        let row = render_row(&item(1, 0, &"x".repeat(200)), 0, 30);
        assert_eq!(unicode_width::UnicodeWidthStr::width(row.as_str()), 30);
        assert!(row.ends_with('…'));
    }
}
