//! Canonical Endpoint Keys
//!
//! Derives the identity of a logical stream channel from a request URL.
//! Two requests that differ only in their query string (different symbol,
//! different account) target the same channel and therefore map to the
//! same key; requests with different paths are distinct channels.

use std::fmt;

use url::Url;

/// Identity of a logical stream channel.
///
/// Built from scheme + host (+ explicit non-default port) + path of a URL,
/// with the query string and fragment dropped.
///
/// # Example
///
/// ```rust
/// use stream_core::EndpointKey;
///
/// let a = EndpointKey::from_url("https://api.example.com/v1/stream?symbol=EURUSD");
/// let b = EndpointKey::from_url("https://api.example.com/v1/stream?symbol=GBPUSD");
/// assert_eq!(a, b);
///
/// let c = EndpointKey::from_url("https://api.example.com/v1/balance?symbol=EURUSD");
/// assert_ne!(a, c);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey(String);

impl EndpointKey {
    /// Derive the canonical key for a URL.
    ///
    /// Unparseable input falls back to the raw string as its own key:
    /// degraded but deterministic, every distinct raw string becomes its
    /// own channel. This function never panics.
    #[must_use]
    pub fn from_url(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) => match url.host_str() {
                Some(host) => {
                    let mut key =
                        String::with_capacity(url.scheme().len() + host.len() + url.path().len() + 9);
                    key.push_str(url.scheme());
                    key.push_str("://");
                    key.push_str(host);
                    if let Some(port) = url.port() {
                        key.push(':');
                        key.push_str(&port.to_string());
                    }
                    key.push_str(url.path());
                    Self(key)
                }
                // cannot-be-a-base URLs carry no authority to normalize
                None => Self(raw.to_string()),
            },
            Err(_) => Self(raw.to_string()),
        }
    }

    /// The canonical key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn query_string_is_ignored() {
        let a = EndpointKey::from_url("https://api.example.com/v1/stream?symbol=EURUSD");
        let b = EndpointKey::from_url("https://api.example.com/v1/stream?symbol=GBPUSD&account=1");
        let bare = EndpointKey::from_url("https://api.example.com/v1/stream");
        assert_eq!(a, b);
        assert_eq!(a, bare);
    }

    #[test]
    fn fragment_is_ignored() {
        let a = EndpointKey::from_url("https://api.example.com/v1/stream#top");
        let b = EndpointKey::from_url("https://api.example.com/v1/stream");
        assert_eq!(a, b);
    }

    #[test]
    fn different_paths_are_distinct() {
        let a = EndpointKey::from_url("https://api.example.com/v1/market/stream");
        let b = EndpointKey::from_url("https://api.example.com/v1/accounting/balance/stream");
        assert_ne!(a, b);
    }

    #[test]
    fn explicit_port_is_part_of_the_key() {
        let a = EndpointKey::from_url("https://api.example.com:8443/v1/stream");
        let b = EndpointKey::from_url("https://api.example.com/v1/stream");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "https://api.example.com:8443/v1/stream");
    }

    #[test]
    fn default_port_normalizes_away() {
        let a = EndpointKey::from_url("https://api.example.com:443/v1/stream");
        let b = EndpointKey::from_url("https://api.example.com/v1/stream");
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_url_falls_back_to_raw_string() {
        let a = EndpointKey::from_url("not a url");
        let b = EndpointKey::from_url("not a url");
        let c = EndpointKey::from_url("also not a url");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "not a url");
    }

    #[test]
    fn host_relative_input_falls_back_to_raw_string() {
        // data: URLs parse but have no host to normalize against
        let key = EndpointKey::from_url("data:text/plain,hello");
        assert_eq!(key.as_str(), "data:text/plain,hello");
    }

    #[test]
    fn display_matches_as_str() {
        let key = EndpointKey::from_url("https://api.example.com/v1/stream?x=1");
        assert_eq!(key.to_string(), key.as_str());
    }

    proptest! {
        #[test]
        fn any_query_string_yields_the_same_key(query in "[a-z0-9_=&%-]{0,64}") {
            let base = "https://api.example.com/v1/stream";
            let with_query = format!("{base}?{query}");
            prop_assert_eq!(EndpointKey::from_url(base), EndpointKey::from_url(&with_query));
        }
    }
}
