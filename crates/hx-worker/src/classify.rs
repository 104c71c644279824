//! Request classification
//!
//! Maps an intercepted request to the caching strategy that serves it.
//! Rules are checked in order and the first match wins.

use hx_net::{Method, Request};

use crate::config::WorkerConfig;

/// How a request is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Non-GET; left to the host's default network behaviour
    Passthrough,
    /// Websocket or framework-internal traffic; not intercepted
    Ignore,
    /// API or partner traffic; JSON 503 when offline
    NetworkOnly,
    /// Static asset; served from cache and refreshed in the background
    CacheFirst,
    /// Documents and everything else; cache and offline page as fallback
    NetworkFirst,
}

impl Disposition {
    /// Whether the worker responds to the request at all
    pub fn intercepts(&self) -> bool {
        !matches!(self, Disposition::Passthrough | Disposition::Ignore)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Passthrough => "passthrough",
            Disposition::Ignore => "ignore",
            Disposition::NetworkOnly => "network-only",
            Disposition::CacheFirst => "cache-first",
            Disposition::NetworkFirst => "network-first",
        }
    }
}

/// Classify a request
pub fn classify(request: &Request, config: &WorkerConfig) -> Disposition {
    if request.method != Method::Get {
        return Disposition::Passthrough;
    }

    let url = &request.url;
    let path = url.path();

    if matches!(url.scheme(), "ws" | "wss")
        || config.internal_markers.iter().any(|m| path.contains(m.as_str()))
    {
        return Disposition::Ignore;
    }

    if path.contains(config.api_marker.as_str()) || is_partner_host(url.host_str(), config) {
        return Disposition::NetworkOnly;
    }

    if has_static_extension(path, config) {
        return Disposition::CacheFirst;
    }

    Disposition::NetworkFirst
}

fn is_partner_host(host: Option<&str>, config: &WorkerConfig) -> bool {
    let Some(host) = host else {
        return false;
    };

    config.partner_hosts.iter().any(|partner| {
        host.eq_ignore_ascii_case(partner)
            || host
                .len()
                .checked_sub(partner.len() + 1)
                .is_some_and(|dot| {
                    host.as_bytes()[dot] == b'.' && host[dot + 1..].eq_ignore_ascii_case(partner)
                })
    })
}

fn has_static_extension(path: &str, config: &WorkerConfig) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => config
            .static_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}
