//! Host services available to the worker

use std::future::Future;
use std::sync::Arc;

use url::Url;

use crate::error::WorkerError;
use crate::notify::Notification;

/// Global scope of the worker: lifecycle control, clients, notifications
pub trait WorkerScope {
    /// Activate this version without waiting for older instances to finish
    fn skip_waiting(&self) -> impl Future<Output = ()>;

    /// Take control of every open client
    fn claim_clients(&self) -> impl Future<Output = ()>;

    fn show_notification(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), WorkerError>>;

    fn close_notification(&self, notification: &Notification) -> impl Future<Output = ()>;

    /// Open or focus a window at `url`
    fn open_window(&self, url: &Url) -> impl Future<Output = Result<(), WorkerError>>;
}

impl<T: WorkerScope + ?Sized> WorkerScope for Arc<T> {
    fn skip_waiting(&self) -> impl Future<Output = ()> {
        (**self).skip_waiting()
    }

    fn claim_clients(&self) -> impl Future<Output = ()> {
        (**self).claim_clients()
    }

    fn show_notification(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), WorkerError>> {
        (**self).show_notification(notification)
    }

    fn close_notification(&self, notification: &Notification) -> impl Future<Output = ()> {
        (**self).close_notification(notification)
    }

    fn open_window(&self, url: &Url) -> impl Future<Output = Result<(), WorkerError>> {
        (**self).open_window(url)
    }
}
