//! HyperionX Networking
//!
//! Request/response types and the two host collaborators the worker talks
//! to: the network (`Fetch`) and named cache stores (`CacheStorage`).

pub mod cache;
pub mod loader;

use std::future::Future;

pub use cache::{Cache, CacheError, CacheStorage, MemoryCache, MemoryCacheStorage};
pub use loader::{HttpLoader, LoaderConfig, Method, Request, RequestMode};
pub use url::Url;

/// Network collaborator
///
/// Fails with an error only when no response could be obtained at all.
/// HTTP error statuses are still `Ok`.
pub trait Fetch {
    fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response, NetError>>;
}

impl<T: Fetch + ?Sized> Fetch for std::sync::Arc<T> {
    fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response, NetError>> {
        (**self).fetch(request)
    }
}

/// HTTP Response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Plain-text response
    pub fn plain(status: u16, text: &str) -> Self {
        Self::new(status, text).with_header("Content-Type", "text/plain")
    }

    /// JSON error response of the form `{"error": message}`
    pub fn json_error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status, body).with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Check if response is OK (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Get body as text
    pub fn text(&self) -> Result<String, NetError> {
        String::from_utf8(self.body.clone()).map_err(|e| NetError::Decode(e.to_string()))
    }

    /// Get body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.body).map_err(|e| NetError::Decode(e.to_string()))
    }
}

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Decode error: {0}")]
    Decode(String),
}
