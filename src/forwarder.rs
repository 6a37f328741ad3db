//! Forwards window activations to the notifier.
//!
//! The forwarder holds no state between events. Each activation resolves to
//! exactly one outbound call, in delivery order, with no deduplication.

use tracing::info;
use tracing::trace;

use crate::domain::ActivationEvent;
use crate::notifier::Notifier;
use crate::source::ActivationSource;
use crate::source::SourceError;

/// Relays activation events to a [`Notifier`].
#[derive(Debug)]
pub struct EventForwarder<N> {
    notifier: N,
}

impl<N: Notifier> EventForwarder<N> {
    /// Create a forwarder that issues calls through `notifier`.
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    /// Borrow the underlying notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Handle one activation: issue exactly one fire-and-forget call.
    ///
    /// Delivery failures are dropped here and never reach the caller.
    pub async fn on_activation(&self, event: &ActivationEvent) {
        let call = event.resolve();
        trace!("Forwarding {}", call);
        // One-way call: the outcome is intentionally discarded.
        let _ = self.notifier.notify(&call).await;
    }

    /// Subscribe to `source` and forward every activation it delivers.
    ///
    /// Runs until the source fails for good, returning that error.
    pub async fn subscribe<S>(&self, source: &mut S) -> SourceError
    where
        S: ActivationSource + ?Sized,
    {
        info!("Subscribed to window activations");
        loop {
            match source.next_event().await {
                Ok(event) => self.on_activation(&event).await,
                Err(e) => return e,
            }
        }
    }
}
