//! Simulated host
//!
//! In-memory stand-ins for the network, cache storage and worker scope.
//! Every operation lands in a shared `EffectLog`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hx_net::{
    Cache, CacheError, CacheStorage, Fetch, MemoryCache, MemoryCacheStorage, NetError, Request,
    Response,
};
use url::Url;

use crate::config::{ConfigError, WorkerConfig};
use crate::effect::{Effect, EffectLog};
use crate::error::WorkerError;
use crate::event::{FetchEvent, Served};
use crate::notify::Notification;
use crate::scope::WorkerScope;
use crate::worker::ServiceWorker;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted network
///
/// Unrouted URLs answer 404. Offline, or for URLs marked failing, fetches
/// error out.
#[derive(Debug)]
pub struct SimNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    online: AtomicBool,
    log: EffectLog,
}

impl SimNetwork {
    pub fn new(log: EffectLog) -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            online: AtomicBool::new(true),
            log,
        }
    }

    pub fn route(&self, url: &str, response: Response) {
        lock(&self.routes).insert(url.to_string(), response);
    }

    /// Make fetches of `url` fail at the network layer
    pub fn fail(&self, url: &str) {
        lock(&self.failing).insert(url.to_string());
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Fetch for SimNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        let url = request.url.to_string();
        self.log.record(Effect::Fetch { url: url.clone() });

        if !self.online.load(Ordering::SeqCst) || lock(&self.failing).contains(&url) {
            return Err(NetError::Network(format!("{url}: offline")));
        }

        Ok(lock(&self.routes)
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::plain(404, "Not Found")))
    }
}

/// Recording cache handle
#[derive(Debug, Clone)]
pub struct SimCache {
    inner: MemoryCache,
    log: EffectLog,
}

impl Cache for SimCache {
    async fn match_request(&self, request: &Request) -> Result<Option<Response>, CacheError> {
        let hit = self.inner.match_request(request).await?;
        self.log.record(Effect::CacheRead {
            cache: self.inner.name().to_string(),
            url: request.url.to_string(),
            hit: hit.is_some(),
        });
        Ok(hit)
    }

    async fn put(&self, request: Request, response: Response) -> Result<(), CacheError> {
        let url = request.url.to_string();
        self.inner.put(request, response).await?;
        self.log.record(Effect::CacheWrite {
            cache: self.inner.name().to_string(),
            url,
        });
        Ok(())
    }

    async fn delete(&self, request: &Request) -> Result<bool, CacheError> {
        self.inner.delete(request).await
    }

    async fn keys(&self) -> Result<Vec<Request>, CacheError> {
        self.inner.keys().await
    }
}

/// Recording cache storage
#[derive(Debug)]
pub struct SimCacheStorage {
    inner: MemoryCacheStorage,
    failing_deletes: Mutex<HashSet<String>>,
    log: EffectLog,
}

impl SimCacheStorage {
    pub fn new(log: EffectLog) -> Self {
        Self::with_storage(MemoryCacheStorage::new(), log)
    }

    pub fn with_storage(inner: MemoryCacheStorage, log: EffectLog) -> Self {
        Self {
            inner,
            failing_deletes: Mutex::new(HashSet::new()),
            log,
        }
    }

    /// Make deleting cache `name` fail
    pub fn fail_delete(&self, name: &str) {
        lock(&self.failing_deletes).insert(name.to_string());
    }
}

impl CacheStorage for SimCacheStorage {
    type Cache = SimCache;

    async fn open(&self, name: &str) -> Result<SimCache, CacheError> {
        Ok(SimCache {
            inner: self.inner.open(name).await?,
            log: self.log.clone(),
        })
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        if lock(&self.failing_deletes).contains(name) {
            return Err(CacheError::Unavailable(format!("{name} is locked")));
        }

        let existed = self.inner.delete(name).await?;
        self.log.record(Effect::CacheDelete {
            cache: name.to_string(),
        });
        Ok(existed)
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.inner.keys().await
    }
}

/// Recording worker scope
#[derive(Debug, Default)]
pub struct SimScope {
    log: EffectLog,
    notifications: Mutex<Vec<Notification>>,
    windows: Mutex<Vec<Url>>,
    deny_notifications: AtomicBool,
}

impl SimScope {
    pub fn new(log: EffectLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Notifications currently displayed
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    /// Windows opened, in order
    pub fn windows(&self) -> Vec<Url> {
        lock(&self.windows).clone()
    }

    /// Simulate a denied notification permission
    pub fn deny_notifications(&self) {
        self.deny_notifications.store(true, Ordering::SeqCst);
    }
}

impl WorkerScope for SimScope {
    async fn skip_waiting(&self) {
        self.log.record(Effect::SkipWaiting);
    }

    async fn claim_clients(&self) {
        self.log.record(Effect::ClaimClients);
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), WorkerError> {
        if self.deny_notifications.load(Ordering::SeqCst) {
            return Err(WorkerError::Host("notification permission".into()));
        }

        self.log.record(Effect::ShowNotification {
            title: notification.title.clone(),
        });
        lock(&self.notifications).push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self, notification: &Notification) {
        self.log.record(Effect::CloseNotification {
            title: notification.title.clone(),
        });
        lock(&self.notifications).retain(|n| n != notification);
    }

    async fn open_window(&self, url: &Url) -> Result<(), WorkerError> {
        self.log.record(Effect::OpenWindow {
            url: url.to_string(),
        });
        lock(&self.windows).push(url.clone());
        Ok(())
    }
}

/// Worker wired to a simulated host
pub type SimWorker = ServiceWorker<SimNetwork, SimCacheStorage, Arc<SimScope>>;

/// Simulated host: collaborators plus the log they share
#[derive(Debug, Clone)]
pub struct SimHost {
    pub log: EffectLog,
    pub network: Arc<SimNetwork>,
    pub caches: Arc<SimCacheStorage>,
    pub scope: Arc<SimScope>,
}

impl SimHost {
    pub fn new() -> Self {
        let log = EffectLog::new();
        Self {
            network: Arc::new(SimNetwork::new(log.clone())),
            caches: Arc::new(SimCacheStorage::new(log.clone())),
            scope: Arc::new(SimScope::new(log.clone())),
            log,
        }
    }

    pub fn worker(&self, config: WorkerConfig) -> Result<SimWorker, ConfigError> {
        ServiceWorker::new(
            config,
            Arc::clone(&self.network),
            Arc::clone(&self.caches),
            Arc::clone(&self.scope),
        )
    }

    /// Route every precache locator, answering with its own path as body
    pub fn serve_precache(&self, config: &WorkerConfig) -> Result<(), ConfigError> {
        for (locator, url) in config.precache.iter().zip(config.precache_urls()?) {
            self.network.route(url.as_str(), Response::new(200, locator.as_str()));
        }
        Ok(())
    }

    /// Dispatch a fetch event the way a browser would
    ///
    /// Records `Respond` as soon as the worker produced a response, then lets
    /// its wait-until work settle. `None` when the worker did not intercept.
    pub async fn dispatch_fetch(
        &self,
        worker: &SimWorker,
        request: Request,
    ) -> Option<Result<Served, WorkerError>> {
        let outcome = worker.handle_fetch(FetchEvent::new(request)).await?;

        if let Ok(served) = &outcome.result {
            self.log.record(Effect::Respond {
                status: served.response.status,
            });
        }
        outcome.wait_until.settle().await;

        Some(outcome.result)
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}
