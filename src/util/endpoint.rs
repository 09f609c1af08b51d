use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors from validating the API endpoint.
#[derive(Error, Debug)]
pub enum EndpointError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a non-loopback host would expose the access token.
    #[error("Insecure endpoint {0}: HTTPS required (except localhost for testing)")]
    Insecure(String),
    /// The URL cannot carry a path (e.g. `https:example`).
    #[error("Endpoint URL has no host")]
    MissingHost,
}

/// Validates the base URL of the feed API.
///
/// Accepts any `https` URL with a host. Plain `http` is accepted only for
/// loopback hosts (`localhost`, `127.0.0.1`, `::1`) so tests can run against
/// a local mock server; everywhere else the access token would travel in
/// clear text.
///
/// # Examples
///
/// ```
/// use newsfeed::util::validate_endpoint;
///
/// assert!(validate_endpoint("https://api.vk.com/method").is_ok());
/// assert!(validate_endpoint("http://127.0.0.1:8080").is_ok());
/// assert!(validate_endpoint("http://api.vk.com/method").is_err());
/// ```
pub fn validate_endpoint(url_str: &str) -> Result<Url, EndpointError> {
    let url = Url::parse(url_str)?;

    let host = url.host_str().ok_or(EndpointError::MissingHost)?;
    if url.cannot_be_a_base() {
        return Err(EndpointError::MissingHost);
    }

    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback_host(host) => {
            tracing::warn!(endpoint = %url, "Using non-HTTPS endpoint (localhost only)");
            Ok(url)
        }
        "http" => Err(EndpointError::Insecure(host.to_owned())),
        scheme => Err(EndpointError::UnsupportedScheme(scheme.to_owned())),
    }
}

fn is_loopback_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
