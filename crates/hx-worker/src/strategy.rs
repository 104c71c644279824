//! Caching strategies
//!
//! Cache reads and writes never fail a response: a broken store is logged
//! and treated as a miss.

use std::sync::Arc;

use hx_net::{Cache, CacheStorage, Fetch, Method, Request, Response};

use crate::error::WorkerError;
use crate::event::{ResponseSource, Served, WaitUntil};
use crate::scope::WorkerScope;
use crate::worker::ServiceWorker;

impl<N, C, S> ServiceWorker<N, C, S>
where
    N: Fetch + 'static,
    C: CacheStorage + 'static,
    C::Cache: 'static,
    S: WorkerScope,
{
    /// Network only; a failed fetch becomes `503 {"error":"Offline"}`
    pub(crate) async fn network_only(&self, request: &Request) -> Served {
        match self.network.fetch(request).await {
            Ok(response) => Served::new(response, ResponseSource::Network),
            Err(err) => {
                tracing::warn!("[SW] API request failed for {}: {}", request.url, err);
                Served::new(Response::json_error(503, "Offline"), ResponseSource::Synthesized)
            }
        }
    }

    /// Cache first, revalidating hits in the background
    pub(crate) async fn cache_first(
        &self,
        request: Request,
        wait_until: &mut WaitUntil,
    ) -> Result<Served, WorkerError> {
        let name = &self.config.cache_name;

        let cached = lookup(&*self.caches, name, &request).await;
        if let Some(cached) = cached {
            wait_until.push(revalidate(
                Arc::clone(&self.network),
                Arc::clone(&self.caches),
                name.clone(),
                request,
            ));
            return Ok(Served::new(cached, ResponseSource::Cache));
        }

        let response = self.network.fetch(&request).await?;
        if response.is_success() {
            store(&*self.caches, name, request, response.clone()).await;
        }
        Ok(Served::new(response, ResponseSource::Network))
    }

    /// Network first; falls back to the cache, then the offline page for
    /// navigations, then a plain 503
    pub(crate) async fn network_first(&self, request: Request) -> Served {
        let name = &self.config.cache_name;

        let fetched = self.network.fetch(&request).await;
        let err = match fetched {
            Ok(response) => {
                if response.is_success() {
                    store(&*self.caches, name, request, response.clone()).await;
                }
                return Served::new(response, ResponseSource::Network);
            }
            Err(err) => err,
        };

        tracing::debug!("[SW] Network failed for {}: {}", request.url, err);

        if let Some(cached) = lookup(&*self.caches, name, &request).await {
            return Served::new(cached, ResponseSource::Cache);
        }

        if request.is_navigation() {
            let offline = Request::new(Method::Get, self.offline_url.clone());
            if let Some(page) = lookup(&*self.caches, name, &offline).await {
                return Served::new(page, ResponseSource::OfflinePage);
            }
            tracing::warn!("[SW] Offline page missing from {}", name);
        }

        Served::new(Response::plain(503, "Offline"), ResponseSource::Synthesized)
    }
}

/// Refresh a cached entry; the outcome is never reported
async fn revalidate<N, C>(network: Arc<N>, caches: Arc<C>, name: String, request: Request)
where
    N: Fetch,
    C: CacheStorage,
{
    let fetched = network.fetch(&request).await;
    match fetched {
        Ok(response) if response.is_success() => {
            store(&*caches, &name, request, response).await;
        }
        Ok(response) => {
            tracing::debug!("[SW] Revalidation of {} got {}", request.url, response.status)
        }
        Err(err) => tracing::debug!("[SW] Revalidation of {} failed: {}", request.url, err),
    }
}

async fn lookup<C: CacheStorage>(caches: &C, name: &str, request: &Request) -> Option<Response> {
    let result = match caches.open(name).await {
        Ok(cache) => cache.match_request(request).await,
        Err(err) => Err(err),
    };

    result.unwrap_or_else(|err| {
        tracing::warn!("[SW] Cache lookup for {} failed: {}", request.url, err);
        None
    })
}

async fn store<C: CacheStorage>(caches: &C, name: &str, request: Request, response: Response) {
    let url = request.url.clone();
    let result = match caches.open(name).await {
        Ok(cache) => cache.put(request, response).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        tracing::warn!("[SW] Failed to cache {}: {}", url, err);
    }
}
