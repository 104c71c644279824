//! HyperionX Worker
//!
//! Offline caching worker: precache on install, purge stale generations on
//! activate, per-resource caching strategies on fetch, push notification
//! relay and a background sync hook.
//!
//! Hosts supply three collaborators: a network (`hx_net::Fetch`), cache
//! storage (`hx_net::CacheStorage`) and a [`WorkerScope`]. The [`sim`]
//! module provides in-memory ones that record what the worker did.

mod classify;
mod config;
mod effect;
mod error;
mod event;
mod lifecycle;
mod notify;
mod scope;
mod strategy;
mod sync;
mod worker;

pub mod sim;

pub use classify::{Disposition, classify};
pub use config::{
    CACHE_NAME, ConfigError, NotificationDefaults, OFFLINE_PAGE, PRECACHE, SYNC_MESSAGES,
    WorkerConfig,
};
pub use effect::{Effect, EffectLog};
pub use error::WorkerError;
pub use event::{
    FetchEvent, FetchOutcome, NotificationClickEvent, PushEvent, ResponseSource, Served, SyncEvent,
    WaitUntil,
};
pub use lifecycle::ServiceWorkerState;
pub use notify::{Notification, NotificationData, NotificationOptions, PushPayload};
pub use scope::WorkerScope;
pub use sync::sync_messages;
pub use worker::ServiceWorker;
