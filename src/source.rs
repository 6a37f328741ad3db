//! Activation event sources.
//!
//! This module provides a generic abstraction over the window manager side:
//! anything that can report "this window just became active".

mod hyprland;
mod json_lines;
mod x11;

use async_trait::async_trait;
pub use hyprland::HyprlandSource;
pub use json_lines::JsonLinesSource;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
pub use x11::X11Source;

use crate::domain::ActivationEvent;

/// Trait for activation event sources.
#[async_trait]
pub trait ActivationSource: Send {
    /// Get the next activation event.
    ///
    /// Waits until a window is activated or an unrecoverable error happens.
    /// Implementations handle transient reconnection internally.
    async fn next_event(&mut self) -> Result<ActivationEvent, SourceError>;
}

/// Selectable source backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Hyprland socket2 event stream.
    #[default]
    Hyprland,
    /// X11 `_NET_ACTIVE_WINDOW` property changes.
    X11,
    /// JSON objects, one per line, on stdin.
    Stdin,
}

/// Errors that can occur while reading activation events.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Socket path not found: {0}")]
    SocketNotFound(String),

    #[error("Event stream closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
