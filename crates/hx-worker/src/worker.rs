//! Service Worker
//!
//! Event handlers for one deployed worker version.

use std::sync::Arc;

use hx_net::{CacheStorage, Fetch};
use url::Url;

use crate::classify::{Disposition, classify};
use crate::config::{ConfigError, WorkerConfig};
use crate::error::WorkerError;
use crate::event::{
    FetchEvent, FetchOutcome, NotificationClickEvent, PushEvent, SyncEvent, WaitUntil,
};
use crate::lifecycle::ServiceWorkerState;
use crate::notify::{Notification, PushPayload};
use crate::scope::WorkerScope;
use crate::sync;

/// A worker bound to its host collaborators
///
/// `N` is the network, `C` the cache storage and `S` the global scope.
/// Network and storage are shared with background work, hence the `Arc`s.
#[derive(Debug)]
pub struct ServiceWorker<N, C, S> {
    pub(crate) config: WorkerConfig,
    pub(crate) network: Arc<N>,
    pub(crate) caches: Arc<C>,
    pub(crate) scope: S,
    pub(crate) precache_urls: Vec<Url>,
    pub(crate) offline_url: Url,
    pub(crate) state: ServiceWorkerState,
}

impl<N, C, S> ServiceWorker<N, C, S> {
    pub fn new(
        config: WorkerConfig,
        network: Arc<N>,
        caches: Arc<C>,
        scope: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let precache_urls = config.precache_urls()?;
        let offline_url = config.offline_url()?;

        Ok(Self {
            config,
            network,
            caches,
            scope,
            precache_urls,
            offline_url,
            state: ServiceWorkerState::Parsed,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> ServiceWorkerState {
        self.state
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }
}

impl<N, C, S> ServiceWorker<N, C, S>
where
    N: Fetch + 'static,
    C: CacheStorage + 'static,
    C::Cache: 'static,
    S: WorkerScope,
{
    /// Handle an intercepted request
    ///
    /// `None` means the request is not intercepted and the host's default
    /// network behaviour applies.
    pub async fn handle_fetch(&self, event: FetchEvent) -> Option<FetchOutcome> {
        let request = event.request;
        let disposition = classify(&request, &self.config);
        let mut wait_until = WaitUntil::new();

        let result = match disposition {
            Disposition::Passthrough | Disposition::Ignore => {
                tracing::trace!(
                    "[SW] Not intercepting {} {}",
                    request.method.as_str(),
                    request.url
                );
                return None;
            }
            Disposition::NetworkOnly => Ok(self.network_only(&request).await),
            Disposition::CacheFirst => self.cache_first(request, &mut wait_until).await,
            Disposition::NetworkFirst => Ok(self.network_first(request).await),
        };

        Some(FetchOutcome {
            disposition,
            result,
            wait_until,
        })
    }

    /// Show a notification for a push message
    ///
    /// A push without payload shows nothing. A payload that is not valid
    /// JSON fails the handler before anything is shown.
    pub async fn handle_push(&self, event: PushEvent) -> Result<Option<Notification>, WorkerError> {
        let Some(data) = event.data else {
            tracing::debug!("[SW] Push without payload");
            return Ok(None);
        };

        let payload = PushPayload::parse(&data)?;
        let notification = Notification::from_push(payload, &self.config.notification);
        self.scope.show_notification(&notification).await?;

        tracing::info!("[SW] Notification shown: {}", notification.title);
        Ok(Some(notification))
    }

    /// Close the notification and open its target, returning the opened URL
    pub async fn handle_notification_click(
        &self,
        event: NotificationClickEvent,
    ) -> Result<Url, WorkerError> {
        let notification = event.notification;
        self.scope.close_notification(&notification).await;

        let target = notification
            .target_url()
            .unwrap_or(self.config.notification.url.as_str());
        let url = self.config.resolve(target)?;
        self.scope.open_window(&url).await?;

        Ok(url)
    }

    /// Handle a background sync, returning whether the tag was recognised
    pub async fn handle_sync(&self, event: SyncEvent) -> Result<bool, WorkerError> {
        if event.tag != self.config.sync_tag {
            tracing::debug!("[SW] Ignoring sync tag {}", event.tag);
            return Ok(false);
        }

        sync::sync_messages().await?;
        Ok(true)
    }
}
