//! Sends real `NotifyActiveWindow` calls over a private bus.
//!
//! Skipped when no `dbus-daemon` binary is installed.

use std::time::Duration;

use active_window_notifier::ActivationEvent;
use active_window_notifier::EventForwarder;
use active_window_notifier::domain::DESTINATION;
use active_window_notifier::domain::OBJECT_PATH;
use active_window_notifier::notifier::DbusNotifier;
use tokio::sync::mpsc;
use zbus::connection;

struct GesturesHelper {
    tx: mpsc::UnboundedSender<(String, String, String)>,
}

#[zbus::interface(name = "ink.chyk.GesturesHelper")]
impl GesturesHelper {
    fn notify_active_window(&self, title: String, res_class: String, res_name: String) {
        let _ = self.tx.send((title, res_class, res_name));
    }
}

#[tokio::test]
async fn test_calls_reach_receiver() {
    let daemon = match dbus_launch::Launcher::daemon().launch() {
        Ok(daemon) => daemon,
        Err(e) => {
            eprintln!("skipping: cannot launch dbus-daemon: {e}");
            return;
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _receiver = connection::Builder::address(daemon.address())
        .unwrap()
        .name(DESTINATION)
        .unwrap()
        .serve_at(OBJECT_PATH, GesturesHelper { tx })
        .unwrap()
        .build()
        .await
        .unwrap();

    let sender = connection::Builder::address(daemon.address())
        .unwrap()
        .build()
        .await
        .unwrap();
    let forwarder = EventForwarder::new(DbusNotifier::from_connection(sender));

    forwarder
        .on_activation(&ActivationEvent::new(
            Some("Terminal".to_string()),
            Some("xterm".to_string()),
            Some("xterm".to_string()),
        ))
        .await;
    forwarder.on_activation(&ActivationEvent::default()).await;

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for first call")
        .unwrap();
    assert_eq!(
        first,
        ("Terminal".to_string(), "xterm".to_string(), "xterm".to_string())
    );

    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for second call")
        .unwrap();
    assert_eq!(second, (String::new(), String::new(), String::new()));
}

#[tokio::test]
async fn test_unreachable_destination_is_silent() {
    let daemon = match dbus_launch::Launcher::daemon().launch() {
        Ok(daemon) => daemon,
        Err(e) => {
            eprintln!("skipping: cannot launch dbus-daemon: {e}");
            return;
        }
    };

    let sender = connection::Builder::address(daemon.address())
        .unwrap()
        .build()
        .await
        .unwrap();
    let forwarder = EventForwarder::new(DbusNotifier::from_connection(sender));

    // Nobody owns the destination name; the call just vanishes.
    forwarder
        .on_activation(&ActivationEvent::new(Some("Editor".to_string()), None, None))
        .await;
}
