//! Worker errors

use hx_net::{CacheError, NetError};

use crate::config::ConfigError;

/// Error returned from a worker event handler
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("precache of {url} failed: {source}")]
    Precache {
        url: String,
        #[source]
        source: NetError,
    },

    #[error(transparent)]
    Network(#[from] NetError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("malformed push payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("host rejected {0}")]
    Host(String),
}
