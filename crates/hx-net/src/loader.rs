//! Resource Loader
//!
//! Request types and the reqwest-backed network collaborator.

use std::time::Duration;

use url::Url;

use crate::{Fetch, NetError, Response};

/// HTTP method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }
}

/// Request mode, as reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RequestMode {
    /// Top-level document load
    Navigate,
    /// Any sub-resource load
    #[default]
    NoCors,
}

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            mode: RequestMode::default(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// GET request for an absolute URL
    pub fn get(url: &str) -> Result<Self, NetError> {
        Ok(Self::new(Method::Get, parse_url(url)?))
    }

    /// Navigation (document) GET request
    pub fn navigate(url: &str) -> Result<Self, NetError> {
        Ok(Self::get(url)?.with_mode(RequestMode::Navigate))
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Identity used by cache stores: method and URL
    pub fn matches(&self, other: &Request) -> bool {
        self.method == other.method && self.url == other.url
    }
}

fn parse_url(url: &str) -> Result<Url, NetError> {
    Url::parse(url).map_err(|e| NetError::InvalidUrl(format!("{url}: {e}")))
}

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub user_agent: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("HyperionX-Worker/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Live network collaborator
///
/// Runs reqwest's blocking client on smol's blocking pool so the worker's
/// executor never stalls on I/O.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::blocking::Client,
}

impl HttpLoader {
    pub fn new() -> Result<Self, NetError> {
        Self::with_config(LoaderConfig::default())
    }

    pub fn with_config(config: LoaderConfig) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetch for HttpLoader {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        tracing::info!("HTTP {} {}", request.method.as_str(), request.url);

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| NetError::Network(e.to_string()))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        smol::unblock(move || {
            let response = builder.send().map_err(map_reqwest_error)?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = response.bytes().map_err(map_reqwest_error)?.to_vec();

            Ok(Response { status, headers, body })
        })
        .await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> NetError {
    if err.is_timeout() {
        NetError::Timeout
    } else {
        NetError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = Request::get("https://example.com/app.js")
            .unwrap()
            .with_header("Accept", "*/*");

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.mode, RequestMode::NoCors);
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn test_navigate_request() {
        let req = Request::navigate("https://example.com/").unwrap();
        assert!(req.is_navigation());
    }

    #[test]
    fn test_invalid_url() {
        let err = Request::get("not a url").unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
    }

    #[test]
    fn test_identity_ignores_headers() {
        let a = Request::get("https://example.com/x").unwrap();
        let b = a.clone().with_header("Accept", "text/html");
        assert!(a.matches(&b));

        let mut c = a.clone();
        c.method = Method::Head;
        assert!(!a.matches(&c));
    }
}
