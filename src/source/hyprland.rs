//! Hyprland IPC socket2 activation source.
//!
//! Connects to Hyprland's socket2 event stream and turns `activewindow` events
//! into activations. Hyprland reports class and title only, so the resource
//! name is always absent.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::net::UnixStream;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::ActivationSource;
use super::SourceError;
use crate::domain::ActivationEvent;

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(5);
/// Reconnect attempts before the source gives up (about 34 s in total).
const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Hyprland activation source.
pub struct HyprlandSource {
    socket_path: PathBuf,
    reader: Option<BufReader<UnixStream>>,
    backoff: Duration,
}

impl HyprlandSource {
    /// Connect to the socket2 of the running Hyprland instance.
    pub async fn connect() -> Result<Self, SourceError> {
        let socket_path = get_socket2_path()?;
        info!("Connecting to Hyprland socket2: {}", socket_path.display());

        let stream = UnixStream::connect(&socket_path)
            .await
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

        info!("Connected to Hyprland socket2");

        Ok(Self {
            socket_path,
            reader: Some(BufReader::new(stream)),
            backoff: INITIAL_BACKOFF,
        })
    }

    /// Get diagnostic information about the Hyprland environment.
    pub fn get_diagnostics() -> Vec<String> {
        let mut diags = Vec::new();

        for var in ["XDG_RUNTIME_DIR", "HYPRLAND_INSTANCE_SIGNATURE"] {
            match env::var(var) {
                Ok(v) => diags.push(format!("{var}={v}")),
                Err(_) => diags.push(format!("{var}: NOT SET")),
            }
        }

        if let Ok(path) = get_socket2_path() {
            diags.push(format!("Socket2 path: {} (exists)", path.display()));
        } else {
            diags.push("Socket2 path: NOT FOUND".to_string());
        }

        diags
    }

    /// Reconnect to the Hyprland socket, backing off between attempts.
    ///
    /// Fails once [`MAX_RECONNECT_ATTEMPTS`] connects in a row have failed.
    async fn reconnect(&mut self) -> Result<(), SourceError> {
        let mut last_error = String::new();

        for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
            warn!(
                "Socket2 connection lost. Retrying in {:?} (attempt {}/{})...",
                self.backoff, attempt, MAX_RECONNECT_ATTEMPTS
            );

            tokio::time::sleep(self.backoff).await;
            self.backoff = std::cmp::min(self.backoff * 2, MAX_BACKOFF);

            match UnixStream::connect(&self.socket_path).await {
                Ok(stream) => {
                    info!("Reconnected to Hyprland socket2");
                    self.reader = Some(BufReader::new(stream));
                    self.backoff = INITIAL_BACKOFF;
                    return Ok(());
                }
                Err(e) => {
                    debug!("Reconnect attempt {} failed: {}", attempt, e);
                    last_error = e.to_string();
                }
            }
        }

        self.backoff = INITIAL_BACKOFF;
        Err(SourceError::ConnectionFailed(format!(
            "gave up after {MAX_RECONNECT_ATTEMPTS} attempts: {last_error}"
        )))
    }
}

#[async_trait]
impl ActivationSource for HyprlandSource {
    async fn next_event(&mut self) -> Result<ActivationEvent, SourceError> {
        loop {
            let Some(reader) = &mut self.reader else {
                self.reconnect().await?;
                continue;
            };

            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    warn!("Socket2 stream ended (EOF)");
                    self.reader = None;
                }
                Ok(_) => {
                    trace!("Received line: {}", line.trim());
                    if let Some(event) = parse_event_line(&line) {
                        debug!(
                            "Window activated: class={:?}, title={:?}",
                            event.resource_class, event.caption
                        );
                        return Ok(event);
                    }
                }
                Err(e) => {
                    warn!("Read error: {}", e);
                    self.reader = None;
                }
            }
        }
    }
}

/// Get the path to Hyprland's socket2.
fn get_socket2_path() -> Result<PathBuf, SourceError> {
    let xdg_runtime_dir = env::var("XDG_RUNTIME_DIR")
        .map_err(|_| SourceError::EnvVarNotSet("XDG_RUNTIME_DIR".to_string()))?;

    let hyprland_sig = env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| SourceError::EnvVarNotSet("HYPRLAND_INSTANCE_SIGNATURE".to_string()))?;

    let socket_path = PathBuf::from(&xdg_runtime_dir)
        .join("hypr")
        .join(&hyprland_sig)
        .join(".socket2.sock");

    if !socket_path.exists() {
        return Err(SourceError::SocketNotFound(
            socket_path.display().to_string(),
        ));
    }

    Ok(socket_path)
}

/// Parse a single `EVENT>>DATA` line from the socket2 stream.
///
/// Returns `None` for every event other than `activewindow`.
fn parse_event_line(line: &str) -> Option<ActivationEvent> {
    let line = line.trim_end_matches(['\n', '\r']);

    let Some((event_name, data)) = line.split_once(">>") else {
        trace!("Ignoring malformed line (no >>): {}", line);
        return None;
    };

    if event_name != "activewindow" {
        trace!("Ignoring event: {}", event_name);
        return None;
    }

    // WINDOWCLASS,WINDOWTITLE; the title may itself contain commas
    let (class, title) = data.split_once(',').unwrap_or((data, ""));

    Some(ActivationEvent::new(
        Some(title.to_string()),
        Some(class.to_string()),
        None,
    ))
}
