//! JSON shapes of the `newsfeed.get` API.
//!
//! ```json
//! {"response": {
//!     "items":    [{"post_id": 1, "source_id": 10, "date": 1000, "text": "..."}],
//!     "profiles": [{"uid": 10, "first_name": "A", "last_name": "B", "photo": "https://..."}]
//! }}
//! ```
//!
//! or, on failure, `{"error": {"error_code": 5, "error_msg": "..."}}`.

use super::FetchError;
use crate::feed::{Author, FeedItem};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<NewsfeedResponse>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct NewsfeedResponse {
    #[serde(default)]
    items: Vec<WireItem>,
    #[serde(default)]
    profiles: Vec<WireProfile>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    post_id: i64,
    source_id: i64,
    date: i64,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireProfile {
    uid: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    photo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

/// Decode a response body into feed items, newest first.
///
/// Authors are joined from `profiles` by `source_id`; every item by the same
/// author shares one `Arc<Author>`. Items with no matching profile get
/// [`Author::unknown`].
pub(super) fn parse_items(bytes: &[u8]) -> Result<Vec<FeedItem>, FetchError> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;

    if let Some(error) = envelope.error {
        return Err(FetchError::Api {
            code: error.error_code,
            message: error.error_msg,
        });
    }

    let response = envelope.response.ok_or_else(|| {
        FetchError::MalformedResponse("neither `response` nor `error` present".to_string())
    })?;

    let authors: HashMap<i64, Arc<Author>> = response
        .profiles
        .into_iter()
        .map(|p| {
            let author = Author {
                first_name: p.first_name,
                last_name: p.last_name,
                photo_url: p.photo.filter(|url| !url.is_empty()),
            };
            (p.uid, Arc::new(author))
        })
        .collect();
    let unknown = Arc::new(Author::unknown());

    let mut missing_authors = 0usize;
    let mut items: Vec<FeedItem> = response
        .items
        .into_iter()
        .map(|item| {
            let author = match authors.get(&item.source_id) {
                Some(author) => Arc::clone(author),
                None => {
                    missing_authors += 1;
                    Arc::clone(&unknown)
                }
            };
            FeedItem::new(item.post_id, item.date, author, item.text)
        })
        .collect();

    if missing_authors > 0 {
        tracing::debug!(
            count = missing_authors,
            "Feed items without a matching profile"
        );
    }

    // Stable sort: items sharing a timestamp keep the server's order.
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_joins_profiles_and_sorts_newest_first() {
        let body = r#"{"response": {
            "items": [
                {"post_id": 2, "source_id": 10, "date": 900, "text": "older"},
                {"post_id": 1, "source_id": 11, "date": 1000, "text": "newer"}
            ],
            "profiles": [
                {"uid": 10, "first_name": "Ivan", "last_name": "Petrov", "photo": "https://img/1.jpg"},
                {"uid": 11, "first_name": "Anna", "last_name": "Ivanova"}
            ]
        }}"#;

        let items = parse_items(body.as_bytes()).unwrap();
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(items[0].author.display_name(), "Anna Ivanova");
        assert_eq!(&*items[0].body, "newer");
        assert_eq!(
            items[1].author.photo_url.as_deref(),
            Some("https://img/1.jpg")
        );
    }

    #[test]
    fn test_same_author_shared() {
        let body = r#"{"response": {
            "items": [
                {"post_id": 1, "source_id": 10, "date": 2},
                {"post_id": 2, "source_id": 10, "date": 1}
            ],
            "profiles": [{"uid": 10, "first_name": "A", "last_name": "B"}]
        }}"#;
        let items = parse_items(body.as_bytes()).unwrap();
        assert!(Arc::ptr_eq(&items[0].author, &items[1].author));
        assert_eq!(&*items[0].body, "");
    }

    #[test]
    fn test_missing_profile_uses_unknown_author() {
        let body = r#"{"response": {"items": [{"post_id": 1, "source_id": -99, "date": 5}]}}"#;
        let items = parse_items(body.as_bytes()).unwrap();
        assert_eq!(items[0].author.display_name(), "Unknown");
    }

    #[test]
    fn test_equal_timestamps_keep_server_order() {
        let body = r#"{"response": {"items": [
            {"post_id": 7, "source_id": 1, "date": 5},
            {"post_id": 3, "source_id": 1, "date": 5},
            {"post_id": 9, "source_id": 1, "date": 5}
        ]}}"#;
        let items = parse_items(body.as_bytes()).unwrap();
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![7, 3, 9]);
    }

    #[test]
    fn test_empty_response() {
        let items = parse_items(br#"{"response": {}}"#).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_api_error_body() {
        let body = r#"{"error": {"error_code": 5, "error_msg": "User authorization failed"}}"#;
        match parse_items(body.as_bytes()) {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, 5);
                assert_eq!(message, "User authorization failed");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_envelope_is_malformed() {
        assert!(matches!(
            parse_items(b"{}"),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_items(b"<html>"),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_items(br#"{"response": {"items": [{"post_id": "x"}]}}"#),
            Err(FetchError::MalformedResponse(_))
        ));
    }
}
