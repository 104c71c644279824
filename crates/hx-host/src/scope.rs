//! Console scope
//!
//! Stands in for the browser's client and notification services by
//! reporting what the worker asked for.

use std::sync::atomic::{AtomicUsize, Ordering};

use hx_worker::{Notification, WorkerError, WorkerScope};
use url::Url;

#[derive(Debug, Default)]
pub struct ConsoleScope {
    shown: AtomicUsize,
}

impl ConsoleScope {
    /// Notifications shown so far
    pub fn shown(&self) -> usize {
        self.shown.load(Ordering::Relaxed)
    }
}

impl WorkerScope for ConsoleScope {
    async fn skip_waiting(&self) {
        tracing::info!("[HOST] skipWaiting");
    }

    async fn claim_clients(&self) {
        tracing::info!("[HOST] clients claimed");
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), WorkerError> {
        self.shown.fetch_add(1, Ordering::Relaxed);
        println!(
            "notification: {} ({})",
            notification.title,
            notification.options.body.as_deref().unwrap_or_default()
        );
        Ok(())
    }

    async fn close_notification(&self, notification: &Notification) {
        tracing::info!("[HOST] closed notification {}", notification.title);
    }

    async fn open_window(&self, url: &Url) -> Result<(), WorkerError> {
        println!("open window: {url}");
        Ok(())
    }
}
