//! Outbound notification sinks.
//!
//! A [`Notifier`] delivers one resolved `NotifyActiveWindow` call. Delivery is
//! one-way: implementations never wait for or inspect a reply.

mod dbus;

use async_trait::async_trait;
pub use dbus::Bus;
pub use dbus::DbusNotifier;
use thiserror::Error;
use tracing::info;

use crate::domain::NotifyActiveWindow;

/// Trait for one-way notification sinks.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hand the call off for delivery.
    ///
    /// Returns once the call has been queued; no acknowledgment is awaited.
    async fn notify(&self, call: &NotifyActiveWindow) -> Result<(), NotifyError>;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn notify(&self, call: &NotifyActiveWindow) -> Result<(), NotifyError> {
        (**self).notify(call).await
    }
}

/// Errors that can occur while issuing a notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Bus connection failed: {0}")]
    Connect(#[source] zbus::Error),

    #[error("Failed to build method call: {0}")]
    Build(#[source] zbus::Error),

    #[error("Failed to send method call: {0}")]
    Send(#[source] zbus::Error),
}

/// Notifier that logs each call instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn notify(&self, call: &NotifyActiveWindow) -> Result<(), NotifyError> {
        info!("[DRY RUN] Would call {}", call);
        Ok(())
    }
}
