use std::sync::Arc;

/// Display data for the author of a feed item.
///
/// Shared between all items by the same author through `Arc<Author>`, so an
/// item only carries a pointer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub first_name: String,
    pub last_name: String,
    pub photo_url: Option<String>,
}

impl Author {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            photo_url: None,
        }
    }

    /// Placeholder for items whose author was not included in the response.
    pub fn unknown() -> Self {
        Self::new("Unknown", "")
    }

    /// "First Last", without stray whitespace when either part is empty.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// One entry of the news feed.
///
/// Items are immutable once built. String payloads use `Arc` so cloning an
/// item (into a snapshot, an event, or the display list) never copies text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// Opaque identifier, unique within one fetched batch.
    pub id: i64,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub author: Arc<Author>,
    pub body: Arc<str>,
}

impl FeedItem {
    pub fn new(id: i64, timestamp: i64, author: Arc<Author>, body: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            timestamp,
            author,
            body: body.into(),
        }
    }
}
