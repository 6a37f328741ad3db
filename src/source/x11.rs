//! X11 activation source.
//!
//! Watches `_NET_ACTIVE_WINDOW` on the root window. `WM_CLASS` carries both the
//! resource name (instance) and the resource class, so this is the one backend
//! that can fill in all three attributes.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::trace;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::Atom;
use x11rb::protocol::xproto::AtomEnum;
use x11rb::protocol::xproto::ChangeWindowAttributesAux;
use x11rb::protocol::xproto::ConnectionExt;
use x11rb::protocol::xproto::EventMask;
use x11rb::protocol::xproto::GetPropertyReply;
use x11rb::protocol::xproto::PropertyNotifyEvent;
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

use super::ActivationSource;
use super::SourceError;
use crate::domain::ActivationEvent;

/// Upper bound for string property reads, in 32-bit units.
const MAX_STRING_PROPERTY_LEN: u32 = 4096;

/// X11 activation source.
///
/// The X connection is blocking, so it lives on a dedicated thread that feeds
/// events through a channel.
pub struct X11Source {
    rx: mpsc::Receiver<Result<ActivationEvent, String>>,
}

impl X11Source {
    /// Connect to the display named by `$DISPLAY` and start watching.
    pub fn connect() -> Result<Self, SourceError> {
        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;
        let root = conn.setup().roots[screen_num].root;

        let atoms = Atoms::intern(&conn).map_err(SourceError::ConnectionFailed)?;

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )
        .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;
        conn.flush()
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

        info!("Watching _NET_ACTIVE_WINDOW on X11 screen {}", screen_num);

        let (tx, rx) = mpsc::channel(16);
        std::thread::Builder::new()
            .name("x11-activation".to_string())
            .spawn(move || watch(&conn, root, &atoms, &tx))?;

        Ok(Self { rx })
    }
}

#[async_trait]
impl ActivationSource for X11Source {
    async fn next_event(&mut self) -> Result<ActivationEvent, SourceError> {
        match self.rx.recv().await {
            Some(Ok(event)) => Ok(event),
            Some(Err(e)) => Err(SourceError::ConnectionFailed(e)),
            None => Err(SourceError::Closed),
        }
    }
}

/// Atoms looked up once per connection.
struct Atoms {
    net_active_window: Atom,
    net_wm_name: Atom,
    utf8_string: Atom,
}

impl Atoms {
    fn intern<C: Connection>(conn: &C) -> Result<Self, String> {
        Ok(Self {
            net_active_window: intern(conn, b"_NET_ACTIVE_WINDOW")?,
            net_wm_name: intern(conn, b"_NET_WM_NAME")?,
            utf8_string: intern(conn, b"UTF8_STRING")?,
        })
    }
}

fn intern<C: Connection>(conn: &C, name: &[u8]) -> Result<Atom, String> {
    conn.intern_atom(false, name)
        .map_err(|e| e.to_string())?
        .reply()
        .map(|r| r.atom)
        .map_err(|e| e.to_string())
}

/// Event loop run on the watcher thread until the receiver goes away.
fn watch<C: Connection>(
    conn: &C,
    root: Window,
    atoms: &Atoms,
    tx: &mpsc::Sender<Result<ActivationEvent, String>>,
) {
    loop {
        let event = match conn.wait_for_event() {
            Ok(event) => event,
            Err(e) => {
                // Receiver may already be gone; nothing left to report to.
                let _ = tx.blocking_send(Err(e.to_string()));
                return;
            }
        };

        let Event::PropertyNotify(PropertyNotifyEvent { atom, window, .. }) = event else {
            continue;
        };
        if window != root || atom != atoms.net_active_window {
            continue;
        }

        let activation = match active_window(conn, root, atoms.net_active_window) {
            Some(win) => read_activation(conn, win, atoms),
            None => {
                trace!("_NET_ACTIVE_WINDOW cleared");
                ActivationEvent::default()
            }
        };
        debug!(
            "Window activated: class={:?}, name={:?}, title={:?}",
            activation.resource_class, activation.resource_name, activation.caption
        );

        if tx.blocking_send(Ok(activation)).is_err() {
            debug!("X11 source dropped, stopping watcher thread");
            return;
        }
    }
}

fn active_window<C: Connection>(conn: &C, root: Window, net_active_window: Atom) -> Option<Window> {
    let reply = conn
        .get_property(false, root, net_active_window, AtomEnum::WINDOW, 0, 1)
        .ok()?
        .reply()
        .ok()?;
    reply
        .value32()
        .and_then(|mut v| v.next())
        .filter(|&w| w != x11rb::NONE)
}

/// Read caption and `WM_CLASS` of `window`. Unset properties stay absent.
fn read_activation<C: Connection>(conn: &C, window: Window, atoms: &Atoms) -> ActivationEvent {
    let caption = string_property(conn, window, atoms.net_wm_name, atoms.utf8_string)
        .or_else(|| {
            string_property(
                conn,
                window,
                AtomEnum::WM_NAME.into(),
                AtomEnum::STRING.into(),
            )
        })
        .map(|raw| String::from_utf8_lossy(&raw).into_owned());

    let (resource_name, resource_class) = string_property(
        conn,
        window,
        AtomEnum::WM_CLASS.into(),
        AtomEnum::STRING.into(),
    )
    .map_or((None, None), |raw| parse_wm_class(&raw));

    ActivationEvent::new(caption, resource_class, resource_name)
}

/// Raw value of a property, or `None` when the property is not set.
fn string_property<C: Connection>(
    conn: &C,
    window: Window,
    property: Atom,
    type_: Atom,
) -> Option<Vec<u8>> {
    let reply = conn
        .get_property(false, window, property, type_, 0, MAX_STRING_PROPERTY_LEN)
        .ok()?
        .reply()
        .ok()?;

    property_value(reply, type_)
}

/// Extract the value of a `GetProperty` reply requested as `type_`.
///
/// A property stored with another type (e.g. `WM_NAME` as `COMPOUND_TEXT`)
/// comes back with the actual type and no data; treat it as unset.
fn property_value(reply: GetPropertyReply, type_: Atom) -> Option<Vec<u8>> {
    if reply.type_ != type_ {
        trace!("Property type {} does not match requested {}", reply.type_, type_);
        return None;
    }
    if reply.bytes_after > 0 {
        debug!(
            "Property value truncated to {} bytes ({} bytes not read)",
            reply.value.len(),
            reply.bytes_after
        );
    }
    Some(reply.value)
}

/// Split a `WM_CLASS` value (`instance\0class\0`) into `(instance, class)`.
fn parse_wm_class(raw: &[u8]) -> (Option<String>, Option<String>) {
    let text = String::from_utf8_lossy(raw);
    let mut parts = text.trim_end_matches('\0').splitn(2, '\0');

    let instance = parts.next().map(str::to_string);
    let class = parts
        .next()
        .map(|c| c.trim_end_matches('\0').to_string());

    (instance, class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wm_class_both_parts() {
        assert_eq!(
            parse_wm_class(b"xterm\0XTerm\0"),
            (Some("xterm".to_string()), Some("XTerm".to_string()))
        );
    }

    #[test]
    fn test_parse_wm_class_without_trailing_nul() {
        assert_eq!(
            parse_wm_class(b"dolphin\0org.kde.dolphin"),
            (Some("dolphin".to_string()), Some("org.kde.dolphin".to_string()))
        );
    }

    #[test]
    fn test_parse_wm_class_instance_only() {
        assert_eq!(parse_wm_class(b"kitty\0"), (Some("kitty".to_string()), None));
    }

    #[test]
    fn test_parse_wm_class_empty_value() {
        assert_eq!(parse_wm_class(b""), (Some(String::new()), None));
    }

    fn reply(type_: Atom, value: &[u8], bytes_after: u32) -> GetPropertyReply {
        GetPropertyReply {
            format: 8,
            sequence: 1,
            length: 0,
            type_,
            bytes_after,
            value_len: u32::try_from(value.len()).unwrap(),
            value: value.to_vec(),
        }
    }

    #[test]
    fn test_property_value_matching_type() {
        let string = AtomEnum::STRING.into();
        assert_eq!(
            property_value(reply(string, b"xterm\0XTerm\0", 0), string),
            Some(b"xterm\0XTerm\0".to_vec())
        );
    }

    #[test]
    fn test_property_value_unset() {
        assert_eq!(
            property_value(reply(x11rb::NONE, b"", 0), AtomEnum::STRING.into()),
            None
        );
    }

    #[test]
    fn test_property_value_other_type_is_absent() {
        // WM_NAME stored as COMPOUND_TEXT, requested as STRING
        let compound_text = 442;
        assert_eq!(
            property_value(reply(compound_text, b"", 0), AtomEnum::STRING.into()),
            None
        );
    }

    #[test]
    fn test_property_value_present_but_empty() {
        let string = AtomEnum::STRING.into();
        assert_eq!(property_value(reply(string, b"", 0), string), Some(Vec::new()));
    }

    #[test]
    fn test_property_value_truncated_keeps_prefix() {
        let utf8_string = 300;
        assert_eq!(
            property_value(reply(utf8_string, b"long tit", 12), utf8_string),
            Some(b"long tit".to_vec())
        );
    }
}
