//! Remote feed sources.
//!
//! The fetch coordinator only knows the [`FeedSource`] trait: given a time
//! window, return the items published inside it, newest first. This module
//! also provides the HTTP implementation used by the binary:
//!
//! - [`http`] - `newsfeed.get` client with timeouts and body size limits
//! - [`wire`] - JSON response types and their conversion into [`FeedItem`]s
//!
//! [`FeedItem`]: crate::feed::FeedItem

mod http;
mod wire;

pub use http::{HttpFeedSource, HttpSourceOptions};

use crate::feed::{FeedItem, FetchWindow};
use async_trait::async_trait;
use thiserror::Error;

/// Errors a feed source can report for one fetch.
///
/// None of these are fatal: the coordinator logs them, leaves the feed
/// untouched and waits for the next trigger.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The API answered with an error object instead of a response
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
    /// Body was not the expected JSON document
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

impl FetchError {
    /// True for transport problems, false for problems with what came back.
    pub fn is_network(&self) -> bool {
        match self {
            FetchError::Network(_)
            | FetchError::Timeout
            | FetchError::HttpStatus(_)
            | FetchError::IncompleteResponse { .. } => true,
            FetchError::Api { .. }
            | FetchError::MalformedResponse(_)
            | FetchError::ResponseTooLarge => false,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::MalformedResponse(err.to_string())
    }
}

/// Something that can return the feed items inside a time window.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    /// Fetch items with `window.start_time <= timestamp < window.anchor_time`,
    /// ordered newest first.
    async fn fetch(&self, window: FetchWindow) -> Result<Vec<FeedItem>, FetchError>;
}
