//! Cache API
//!
//! Named request/response stores, and an in-memory implementation.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Request, Response};

/// Cache storage error
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("cache storage unavailable: {0}")]
    Unavailable(String),
}

/// A single named store of request/response pairs
pub trait Cache {
    /// Find the response stored for this request identity
    fn match_request(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<Option<Response>, CacheError>>;

    /// Store a response, replacing any entry with the same identity
    fn put(
        &self,
        request: Request,
        response: Response,
    ) -> impl Future<Output = Result<(), CacheError>>;

    /// Delete matching entries
    fn delete(&self, request: &Request) -> impl Future<Output = Result<bool, CacheError>>;

    /// List all cached requests
    fn keys(&self) -> impl Future<Output = Result<Vec<Request>, CacheError>>;
}

/// Container for named caches
pub trait CacheStorage {
    type Cache: Cache;

    /// Open or create a cache
    fn open(&self, name: &str) -> impl Future<Output = Result<Self::Cache, CacheError>>;

    /// Check if cache exists
    fn has(&self, name: &str) -> impl Future<Output = Result<bool, CacheError>>;

    /// Delete a cache, returning whether it existed
    fn delete(&self, name: &str) -> impl Future<Output = Result<bool, CacheError>>;

    /// List all cache names
    fn keys(&self) -> impl Future<Output = Result<Vec<String>, CacheError>>;
}

/// Cache entry
#[derive(Debug, Clone)]
struct CacheEntry {
    request: Request,
    response: Response,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory cache handle
///
/// Clones share entries. A handle stays usable after its cache is deleted
/// from storage, but the storage no longer lists it.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    name: String,
    entries: Arc<Mutex<Vec<CacheEntry>>>,
    max_entries: usize,
}

impl MemoryCache {
    fn new(name: &str, max_entries: usize) -> Self {
        Self {
            name: name.to_string(),
            entries: Arc::new(Mutex::new(Vec::new())),
            max_entries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    async fn match_request(&self, request: &Request) -> Result<Option<Response>, CacheError> {
        Ok(lock(&self.entries)
            .iter()
            .find(|e| e.request.matches(request))
            .map(|e| e.response.clone()))
    }

    async fn put(&self, request: Request, response: Response) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries);
        entries.retain(|e| !e.request.matches(&request));

        if entries.len() >= self.max_entries {
            return Err(CacheError::QuotaExceeded(format!(
                "{} holds {} entries",
                self.name,
                entries.len()
            )));
        }

        entries.push(CacheEntry { request, response });
        Ok(())
    }

    async fn delete(&self, request: &Request) -> Result<bool, CacheError> {
        let mut entries = lock(&self.entries);
        let len = entries.len();
        entries.retain(|e| !e.request.matches(request));
        Ok(entries.len() < len)
    }

    async fn keys(&self) -> Result<Vec<Request>, CacheError> {
        Ok(lock(&self.entries).iter().map(|e| e.request.clone()).collect())
    }
}

/// In-memory cache storage
///
/// Names are kept ordered so `keys()` is deterministic.
#[derive(Debug, Clone)]
pub struct MemoryCacheStorage {
    caches: Arc<Mutex<BTreeMap<String, MemoryCache>>>,
    max_entries: usize,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::with_quota(usize::MAX)
    }

    /// Storage whose caches each hold at most `max_entries` entries
    pub fn with_quota(max_entries: usize) -> Self {
        Self {
            caches: Arc::new(Mutex::new(BTreeMap::new())),
            max_entries,
        }
    }
}

impl Default for MemoryCacheStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStorage for MemoryCacheStorage {
    type Cache = MemoryCache;

    async fn open(&self, name: &str) -> Result<MemoryCache, CacheError> {
        let mut caches = lock(&self.caches);
        let cache = caches
            .entry(name.to_string())
            .or_insert_with(|| MemoryCache::new(name, self.max_entries));
        Ok(cache.clone())
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        Ok(lock(&self.caches).contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        Ok(lock(&self.caches).remove(name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.caches).keys().cloned().collect())
    }
}
