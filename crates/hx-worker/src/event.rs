//! Worker events
//!
//! Event payloads delivered by the host, and the wait-until work handlers
//! hand back to it.

use std::fmt;
use std::future::Future;

use hx_net::{Request, Response};
use smol::LocalExecutor;
use smol::future::BoxedLocal;

use crate::classify::Disposition;
use crate::error::WorkerError;
use crate::notify::Notification;

/// Fetch event for service worker
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub request: Request,
}

impl FetchEvent {
    pub fn new(request: Request) -> Self {
        Self { request }
    }
}

/// Push Event
#[derive(Debug, Clone, Default)]
pub struct PushEvent {
    pub data: Option<Vec<u8>>,
}

impl PushEvent {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    /// Push without a payload
    pub fn empty() -> Self {
        Self { data: None }
    }
}

/// Click on a notification this worker displayed
#[derive(Debug, Clone)]
pub struct NotificationClickEvent {
    pub notification: Notification,
}

impl NotificationClickEvent {
    pub fn new(notification: Notification) -> Self {
        Self { notification }
    }
}

/// Background sync event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    pub tag: String,
}

impl SyncEvent {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
        }
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    OfflinePage,
    /// Built by the worker (503 fallbacks)
    Synthesized,
}

/// Response handed to the host for an intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    pub fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }
}

/// Result of an intercepted fetch
#[derive(Debug)]
pub struct FetchOutcome {
    pub disposition: Disposition,
    pub result: Result<Served, WorkerError>,
    /// Work to drive after the response is delivered
    pub wait_until: WaitUntil,
}

/// Outstanding work the host must let settle before tearing down the event
///
/// Nothing runs until `settle` is awaited, so the response an event produced
/// is always delivered first.
#[derive(Default)]
pub struct WaitUntil {
    tasks: Vec<BoxedLocal<()>>,
}

impl WaitUntil {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: impl Future<Output = ()> + 'static) {
        self.tasks.push(Box::pin(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drive every task to completion, concurrently
    pub async fn settle(self) {
        join_all(self.tasks).await;
    }
}

impl fmt::Debug for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitUntil")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

/// Run futures concurrently on a local executor, collecting outputs in order
pub(crate) async fn join_all<'a, F>(futures: impl IntoIterator<Item = F>) -> Vec<F::Output>
where
    F: Future + 'a,
    F::Output: 'a,
{
    let executor = LocalExecutor::new();
    let tasks: Vec<_> = futures.into_iter().map(|f| executor.spawn(f)).collect();

    executor
        .run(async {
            let mut outputs = Vec::with_capacity(tasks.len());
            for task in tasks {
                outputs.push(task.await);
            }
            outputs
        })
        .await
}
