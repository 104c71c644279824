//! Notification relay
//!
//! Push payloads become system notifications; clicks open the URL the
//! notification carries.

use serde::{Deserialize, Serialize};

use crate::config::NotificationDefaults;

/// Push message body. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
}

impl PushPayload {
    pub fn parse(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

/// Data attached to a notification, returned on click
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
}

/// Notification options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationOptions {
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub vibrate: Vec<u32>,
    pub data: Option<NotificationData>,
}

/// Notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub options: NotificationOptions,
}

impl Notification {
    pub fn new(title: &str, options: NotificationOptions) -> Self {
        Self {
            title: title.to_string(),
            options,
        }
    }

    /// Build the notification for a push, filling gaps from `defaults`
    pub fn from_push(payload: PushPayload, defaults: &NotificationDefaults) -> Self {
        let options = NotificationOptions {
            body: Some(payload.body.unwrap_or_else(|| defaults.body.clone())),
            icon: Some(defaults.icon.clone()),
            badge: Some(defaults.badge.clone()),
            vibrate: defaults.vibrate.clone(),
            data: Some(NotificationData {
                url: payload.url.unwrap_or_else(|| defaults.url.clone()),
            }),
        };

        Self {
            title: payload.title.unwrap_or_else(|| defaults.title.clone()),
            options,
        }
    }

    /// Click target carried in the notification data
    pub fn target_url(&self) -> Option<&str> {
        self.options.data.as_ref().map(|d| d.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_from_full_payload() {
        let payload = PushPayload::parse(br#"{"title":"T","body":"B","url":"/x"}"#).unwrap();
        let notif = Notification::from_push(payload, &NotificationDefaults::default());

        assert_eq!(notif.title, "T");
        assert_eq!(notif.options.body.as_deref(), Some("B"));
        assert_eq!(notif.target_url(), Some("/x"));
        assert_eq!(notif.options.vibrate, vec![100, 50, 100]);
    }

    #[test]
    fn test_notification_defaults() {
        let payload = PushPayload::parse(b"{}").unwrap();
        let notif = Notification::from_push(payload, &NotificationDefaults::default());

        assert_eq!(notif.title, "HyperionX");
        assert_eq!(notif.options.body.as_deref(), Some("New update available"));
        assert_eq!(notif.target_url(), Some("/"));
        assert!(notif.options.icon.is_some());
        assert!(notif.options.badge.is_some());
    }

    #[test]
    fn test_malformed_payload() {
        assert!(PushPayload::parse(b"not json").is_err());
        assert!(PushPayload::parse(br#"{"title": 5}"#).is_err());
    }
}
