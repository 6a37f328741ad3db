//! active-window-notifier - relay active window changes to a D-Bus endpoint.
//!
//! Every time the window manager reports a newly activated window, one
//! one-way `NotifyActiveWindow(caption, resourceClass, resourceName)` call is
//! sent to `ink.chyk.GesturesHelper` at `/ink/chyk/GesturesHelper`.

pub mod config;
pub mod domain;
pub mod forwarder;
pub mod notifier;
pub mod source;

pub use domain::ActivationEvent;
pub use domain::NotifyActiveWindow;
pub use forwarder::EventForwarder;
pub use notifier::Notifier;
pub use source::ActivationSource;
