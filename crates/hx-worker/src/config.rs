//! Worker configuration
//!
//! Everything the policy table reads. `Default` yields the deployed
//! HyperionX values.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

/// Current cache generation
pub const CACHE_NAME: &str = "hyperionx-v1.0.0";

/// Fallback document for failed navigations
pub const OFFLINE_PAGE: &str = "/offline.html";

/// Assets stored on install
pub const PRECACHE: [&str; 5] = [
    "/",
    OFFLINE_PAGE,
    "/app/static/manifest.json",
    "/app/static/icon-192.png",
    "/app/static/icon-512.png",
];

/// Tag of the deferred message delivery task
pub const SYNC_MESSAGES: &str = "sync-messages";

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Defaults applied to push notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    /// Click target when the payload carries none
    pub url: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds
    pub vibrate: Vec<u32>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "HyperionX".to_string(),
            body: "New update available".to_string(),
            url: "/".to_string(),
            icon: "/app/static/icon-192.png".to_string(),
            badge: "/app/static/icon-72.png".to_string(),
            vibrate: vec![100, 50, 100],
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Origin the worker is registered for; relative locators resolve here
    pub origin: String,
    /// Cache generation identifier
    pub cache_name: String,
    pub precache: Vec<String>,
    pub offline_page: String,
    /// Path fragments of framework-internal traffic that is never intercepted
    pub internal_markers: Vec<String>,
    pub api_marker: String,
    /// Hosts whose traffic is network-only (sub-domains included)
    pub partner_hosts: Vec<String>,
    /// Extensions served cache-first
    pub static_extensions: Vec<String>,
    pub sync_tag: String,
    pub notification: NotificationDefaults,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8501".to_string(),
            cache_name: CACHE_NAME.to_string(),
            precache: PRECACHE.iter().map(|s| s.to_string()).collect(),
            offline_page: OFFLINE_PAGE.to_string(),
            internal_markers: vec![
                "/_stcore/".to_string(),
                "/stream".to_string(),
                "/healthz".to_string(),
            ],
            api_marker: "/api/".to_string(),
            partner_hosts: vec!["api.groq.com".to_string(), "api.tavily.com".to_string()],
            static_extensions: ["js", "css", "png", "jpg", "jpeg", "svg", "ico", "woff", "woff2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sync_tag: SYNC_MESSAGES.to_string(),
            notification: NotificationDefaults::default(),
        }
    }
}

impl WorkerConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Invalid("cache_name is empty".into()));
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "origin must be http or https, got {}",
                origin.scheme()
            )));
        }

        for locator in &self.precache {
            self.resolve(locator)?;
        }

        let offline = self.resolve(&self.offline_page)?;
        if !self.precache_urls()?.contains(&offline) {
            return Err(ConfigError::Invalid(format!(
                "offline page {} is not precached",
                self.offline_page
            )));
        }

        Ok(())
    }

    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|source| ConfigError::InvalidUrl {
            url: self.origin.clone(),
            source,
        })
    }

    /// Resolve a locator against the origin
    pub fn resolve(&self, locator: &str) -> Result<Url, ConfigError> {
        self.origin_url()?
            .join(locator)
            .map_err(|source| ConfigError::InvalidUrl {
                url: locator.to_string(),
                source,
            })
    }

    pub fn precache_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.precache.iter().map(|l| self.resolve(l)).collect()
    }

    pub fn offline_url(&self) -> Result<Url, ConfigError> {
        self.resolve(&self.offline_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = WorkerConfig::default();
        config.validate().unwrap();

        assert_eq!(config.cache_name, "hyperionx-v1.0.0");
        assert_eq!(config.precache.len(), 5);
        assert_eq!(
            config.offline_url().unwrap().as_str(),
            "http://localhost:8501/offline.html"
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = WorkerConfig::from_json_str(
            r#"{ "cache_name": "hyperionx-v1.1.0", "notification": { "title": "HX" } }"#,
        )
        .unwrap();

        assert_eq!(config.cache_name, "hyperionx-v1.1.0");
        assert_eq!(config.notification.title, "HX");
        assert_eq!(config.notification.vibrate, vec![100, 50, 100]);
        assert_eq!(config.api_marker, "/api/");
    }

    #[test]
    fn test_offline_page_must_be_precached() {
        let err = WorkerConfig::from_json_str(r#"{ "precache": ["/"] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_non_http_origin() {
        let err = WorkerConfig::from_json_str(r#"{ "origin": "ftp://example.com" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = WorkerConfig::from_json_str("{ cache_name").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_empty_cache_name() {
        let err = WorkerConfig::from_json_str(r#"{ "cache_name": " " }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
