//! Cache lifecycle
//!
//! Install precaches the current generation; activate purges every other
//! generation.

use hx_net::{Cache, CacheStorage, Fetch, Method, NetError, Request, Response};

use crate::error::WorkerError;
use crate::event::join_all;
use crate::scope::WorkerScope;
use crate::worker::ServiceWorker;

/// Service Worker state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceWorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version will never control clients
    Redundant,
}

impl<N, C, S> ServiceWorker<N, C, S>
where
    N: Fetch + 'static,
    C: CacheStorage + 'static,
    C::Cache: 'static,
    S: WorkerScope,
{
    /// Install handler
    ///
    /// Fetches the whole precache list before writing any of it. If one
    /// entry fails the install fails and the worker becomes redundant.
    /// Re-installing over a populated store overwrites the same entries; a
    /// failed re-install restores the ones it had replaced.
    pub async fn install(&mut self) -> Result<(), WorkerError> {
        self.state = ServiceWorkerState::Installing;
        tracing::info!("[SW] Installing {}", self.config.cache_name);

        match self.precache().await {
            Ok(count) => tracing::info!("[SW] Precached {} assets", count),
            Err(err) => {
                tracing::error!("[SW] Precache failed: {}", err);
                self.state = ServiceWorkerState::Redundant;
                return Err(err);
            }
        }

        self.scope.skip_waiting().await;
        self.state = ServiceWorkerState::Installed;
        Ok(())
    }

    async fn precache(&self) -> Result<usize, WorkerError> {
        let cache = self.caches.open(&self.config.cache_name).await?;

        let mut fetched: Vec<(Request, Response)> = Vec::with_capacity(self.precache_urls.len());
        for url in &self.precache_urls {
            let request = Request::new(Method::Get, url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|source| WorkerError::Precache {
                    url: url.to_string(),
                    source,
                })?;

            if !response.is_success() {
                return Err(WorkerError::Precache {
                    url: url.to_string(),
                    source: NetError::HttpError {
                        status: response.status,
                    },
                });
            }
            fetched.push((request, response));
        }

        // Entries this install replaced, so a failed install leaves the
        // store exactly as it found it
        let count = fetched.len();
        let mut written: Vec<(Request, Option<Response>)> = Vec::with_capacity(count);
        for (request, response) in fetched {
            let result = match cache.match_request(&request).await {
                Ok(prior) => cache.put(request.clone(), response).await.map(|()| prior),
                Err(err) => Err(err),
            };

            match result {
                Ok(prior) => written.push((request, prior)),
                Err(err) => {
                    roll_back(&cache, written).await;
                    return Err(err.into());
                }
            }
        }

        Ok(count)
    }

    /// Activate handler
    ///
    /// Deletes every cache whose name is not the current generation, then
    /// claims all clients. Deletions run independently; a failed deletion is
    /// logged and does not stop the others. Returns the number deleted.
    pub async fn activate(&mut self) -> Result<usize, WorkerError> {
        self.state = ServiceWorkerState::Activating;
        tracing::info!("[SW] Activating {}", self.config.cache_name);

        let current = self.config.cache_name.as_str();
        let stale: Vec<String> = self
            .caches
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let caches = &*self.caches;
        let results = join_all(stale.iter().map(|name| async move {
            (name, caches.delete(name).await)
        }))
        .await;

        let mut deleted = 0;
        for (name, result) in results {
            match result {
                Ok(true) => {
                    tracing::info!("[SW] Deleted old cache {}", name);
                    deleted += 1;
                }
                Ok(false) => tracing::debug!("[SW] Cache {} already gone", name),
                Err(err) => tracing::warn!("[SW] Failed to delete cache {}: {}", name, err),
            }
        }

        self.scope.claim_clients().await;
        self.state = ServiceWorkerState::Activated;
        Ok(deleted)
    }
}

/// Undo precache writes, newest first
async fn roll_back<K: Cache>(cache: &K, written: Vec<(Request, Option<Response>)>) {
    for (request, prior) in written.into_iter().rev() {
        let result = match prior {
            Some(response) => cache.put(request.clone(), response).await,
            None => cache.delete(&request).await.map(|_| ()),
        };
        if let Err(err) = result {
            tracing::warn!("[SW] Failed to roll back {}: {}", request.url, err);
        }
    }
}
