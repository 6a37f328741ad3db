//! Domain types for active window notifications.

use serde::Deserialize;
use serde::Serialize;

/// Well-known bus name of the receiving service.
pub const DESTINATION: &str = "ink.chyk.GesturesHelper";

/// Object path the receiving service is served at.
pub const OBJECT_PATH: &str = "/ink/chyk/GesturesHelper";

/// Interface that declares [`METHOD`].
pub const INTERFACE: &str = "ink.chyk.GesturesHelper";

/// Method invoked once per activation.
pub const METHOD: &str = "NotifyActiveWindow";

/// A window gained focus.
///
/// Each attribute is `None` when the event source does not expose it at all,
/// and `Some("")` when it exposes it with an empty value. Both resolve to an
/// empty string on the wire, but sources are free to report either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationEvent {
    /// Window title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Resource class (`WM_CLASS` class part, Wayland `app_id`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_class: Option<String>,

    /// Resource name (`WM_CLASS` instance part).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

impl ActivationEvent {
    /// Create an event from the three optional attributes.
    pub fn new(
        caption: Option<String>,
        resource_class: Option<String>,
        resource_name: Option<String>,
    ) -> Self {
        Self {
            caption,
            resource_class,
            resource_name,
        }
    }

    /// Resolve absent attributes to empty strings, producing the outbound call.
    pub fn resolve(&self) -> NotifyActiveWindow {
        NotifyActiveWindow {
            caption: self.caption.clone().unwrap_or_default(),
            resource_class: self.resource_class.clone().unwrap_or_default(),
            resource_name: self.resource_name.clone().unwrap_or_default(),
        }
    }
}

/// Arguments of one `NotifyActiveWindow` call, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotifyActiveWindow {
    caption: String,
    resource_class: String,
    resource_name: String,
}

impl NotifyActiveWindow {
    /// Window title argument.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Resource class argument.
    pub fn resource_class(&self) -> &str {
        &self.resource_class
    }

    /// Resource name argument.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Positional arguments as sent on the bus (signature `sss`).
    pub fn args(&self) -> (&str, &str, &str) {
        (&self.caption, &self.resource_class, &self.resource_name)
    }
}

impl std::fmt::Display for NotifyActiveWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({:?}, {:?}, {:?})",
            METHOD, self.caption, self.resource_class, self.resource_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_all_present() {
        let event = ActivationEvent::new(
            Some("Terminal".to_string()),
            Some("xterm".to_string()),
            Some("xterm".to_string()),
        );
        assert_eq!(event.resolve().args(), ("Terminal", "xterm", "xterm"));
    }

    #[test]
    fn test_resolve_all_absent() {
        let event = ActivationEvent::default();
        assert_eq!(event.resolve().args(), ("", "", ""));
    }

    #[test]
    fn test_resolve_caption_only() {
        let event = ActivationEvent::new(Some("Editor".to_string()), None, None);
        assert_eq!(event.resolve().args(), ("Editor", "", ""));
    }

    #[test]
    fn test_present_empty_differs_from_absent() {
        let empty = ActivationEvent::new(Some(String::new()), None, None);
        let absent = ActivationEvent::default();
        assert_ne!(empty, absent);
        assert_eq!(empty.resolve(), absent.resolve());
    }

    #[test]
    fn test_deserialize_camel_case_keys() {
        let event: ActivationEvent = serde_json::from_str(
            r#"{"caption":"Terminal","resourceClass":"xterm","resourceName":"xterm"}"#,
        )
        .unwrap();
        assert_eq!(event.caption.as_deref(), Some("Terminal"));
        assert_eq!(event.resource_class.as_deref(), Some("xterm"));
        assert_eq!(event.resource_name.as_deref(), Some("xterm"));
    }

    #[test]
    fn test_deserialize_missing_and_null() {
        let event: ActivationEvent =
            serde_json::from_str(r#"{"caption":"","resourceName":null}"#).unwrap();
        assert_eq!(event.caption, Some(String::new()));
        assert_eq!(event.resource_class, None);
        assert_eq!(event.resource_name, None);
    }

    #[test]
    fn test_display() {
        let call = ActivationEvent::new(Some("Editor".to_string()), None, None).resolve();
        assert_eq!(
            call.to_string(),
            r#"NotifyActiveWindow("Editor", "", "")"#
        );
    }
}
