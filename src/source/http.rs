use super::wire::parse_items;
use super::{FeedSource, FetchError};
use crate::feed::{FeedItem, FetchWindow};
use crate::util::{validate_endpoint, EndpointError};
use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

const METHOD: &str = "newsfeed.get";

/// Tunables for [`HttpFeedSource`].
#[derive(Debug, Clone, Copy)]
pub struct HttpSourceOptions {
    /// Budget for one request, from connect until the last body byte.
    pub timeout: Duration,
    /// Bodies larger than this are rejected.
    pub max_response_bytes: usize,
}

impl Default for HttpSourceOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_response_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// [`FeedSource`] backed by the `newsfeed.get` HTTP method.
pub struct HttpFeedSource {
    client: reqwest::Client,
    method_url: Url,
    access_token: Option<SecretString>,
    options: HttpSourceOptions,
}

impl HttpFeedSource {
    /// Build a source for the API rooted at `endpoint`
    /// (e.g. `https://api.vk.com/method`).
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] if the endpoint is not a usable http(s) URL
    /// or is plain HTTP to a non-loopback host.
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        access_token: Option<SecretString>,
        options: HttpSourceOptions,
    ) -> Result<Self, EndpointError> {
        let mut method_url = validate_endpoint(endpoint)?;
        method_url
            .path_segments_mut()
            .map_err(|_| EndpointError::MissingHost)?
            .pop_if_empty()
            .push(METHOD);

        if access_token.is_none() {
            tracing::info!(endpoint = %endpoint, "No access token configured, requests are anonymous");
        }

        Ok(Self {
            client,
            method_url,
            access_token,
            options,
        })
    }

    /// Full request URL for `window`, without the access token.
    fn request_url(&self, window: FetchWindow) -> Url {
        let mut url = self.method_url.clone();
        url.query_pairs_mut()
            .append_pair("filters", "post")
            .append_pair("start_time", &window.start_time.to_string())
            .append_pair("end_time", &window.anchor_time.to_string());
        url
    }

    async fn fetch_bytes(&self, window: FetchWindow) -> Result<Vec<u8>, FetchError> {
        let url = self.request_url(window);
        tracing::debug!(
            url = %url,
            start_time = window.start_time,
            end_time = window.anchor_time,
            "Requesting feed page"
        );

        // The token goes in after logging so it never shows up in a URL field.
        let mut url = url;
        if let Some(token) = &self.access_token {
            url.query_pairs_mut()
                .append_pair("access_token", token.expose_secret());
        }

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, self.options.max_response_bytes).await
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, window: FetchWindow) -> Result<Vec<FeedItem>, FetchError> {
        let bytes = tokio::time::timeout(self.options.timeout, self.fetch_bytes(window))
            .await
            .map_err(|_| FetchError::Timeout)??;

        let items = parse_items(&bytes)?;
        tracing::debug!(
            items = items.len(),
            bytes = bytes.len(),
            "Feed page received"
        );
        Ok(items)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
