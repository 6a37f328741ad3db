//! D-Bus notifier.
//!
//! Sends `NotifyActiveWindow` as a method call flagged `NO_REPLY_EXPECTED`,
//! so the bus daemon and the receiver never route a reply back to us.

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::trace;
use zbus::Connection;
use zbus::message::Flags;
use zbus::message::Message;

use super::Notifier;
use super::NotifyError;
use crate::domain::DESTINATION;
use crate::domain::INTERFACE;
use crate::domain::METHOD;
use crate::domain::NotifyActiveWindow;
use crate::domain::OBJECT_PATH;

/// Which message bus to connect to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Bus {
    /// Per-login session bus (default).
    #[default]
    Session,
    /// System-wide bus.
    System,
}

/// Notifier backed by a zbus connection.
#[derive(Debug, Clone)]
pub struct DbusNotifier {
    conn: Connection,
}

impl DbusNotifier {
    /// Connect to the given bus.
    pub async fn connect(bus: Bus) -> Result<Self, NotifyError> {
        let conn = match bus {
            Bus::Session => Connection::session().await,
            Bus::System => Connection::system().await,
        }
        .map_err(NotifyError::Connect)?;

        info!(
            "Connected to {:?} bus as {}",
            bus,
            conn.unique_name()
                .map_or_else(|| "<anonymous>".to_string(), ToString::to_string)
        );

        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Notifier for DbusNotifier {
    async fn notify(&self, call: &NotifyActiveWindow) -> Result<(), NotifyError> {
        let msg = build_message(call).map_err(NotifyError::Build)?;
        trace!("Sending {}", call);
        self.conn.send(&msg).await.map_err(NotifyError::Send)?;
        debug!("Sent {}", call);
        Ok(())
    }
}

/// Build the one-way method call message for `call`.
pub(crate) fn build_message(call: &NotifyActiveWindow) -> zbus::Result<Message> {
    Message::method_call(OBJECT_PATH, METHOD)?
        .destination(DESTINATION)?
        .interface(INTERFACE)?
        .with_flags(Flags::NoReplyExpected)?
        .build(&call.args())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivationEvent;

    fn call(caption: Option<&str>, class: Option<&str>, name: Option<&str>) -> NotifyActiveWindow {
        ActivationEvent::new(
            caption.map(str::to_string),
            class.map(str::to_string),
            name.map(str::to_string),
        )
        .resolve()
    }

    #[test]
    fn test_message_coordinates() {
        let msg = build_message(&call(Some("Terminal"), Some("xterm"), Some("xterm"))).unwrap();
        let header = msg.header();

        assert_eq!(header.destination().map(|d| d.as_str()), Some(DESTINATION));
        assert_eq!(header.path().map(|p| p.as_str()), Some(OBJECT_PATH));
        assert_eq!(header.interface().map(|i| i.as_str()), Some(INTERFACE));
        assert_eq!(header.member().map(|m| m.as_str()), Some(METHOD));
    }

    #[test]
    fn test_message_is_one_way() {
        let msg = build_message(&call(None, None, None)).unwrap();
        assert!(msg.primary_header().flags().contains(Flags::NoReplyExpected));
    }

    #[test]
    fn test_message_body_order() {
        let msg = build_message(&call(Some("Editor"), Some("kate"), None)).unwrap();
        let body: (String, String, String) = msg.body().deserialize().unwrap();
        assert_eq!(
            body,
            ("Editor".to_string(), "kate".to_string(), String::new())
        );
    }

    #[test]
    fn test_bus_parse_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            bus: Bus,
        }

        let w: Wrapper = toml::from_str(r#"bus = "system""#).unwrap();
        assert_eq!(w.bus, Bus::System);
        assert_eq!(Bus::default(), Bus::Session);
    }
}
