use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::dates::{parse_wire_timestamp, DateParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    #[default]
    Info,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Warning => write!(f, "warning"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Info => write!(f, "info"),
        }
    }
}

/// A notice emitted by the store after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }
}

/// A notification fetched from the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: String,
    #[serde(default)]
    pub read: bool,
}

impl NotificationRecord {
    pub fn normalize(self) -> Result<Notification, DateParseError> {
        Ok(Notification {
            created_at: parse_wire_timestamp("createdAt", &self.created_at)?,
            id: self.id,
            kind: self.kind,
            message: self.message,
            read: self.read,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_serializes_type_field() {
        let json = serde_json::to_string(&Notice::warning("Request rejected")).unwrap();
        assert_eq!(json, r#"{"type":"warning","message":"Request rejected"}"#);
    }

    #[test]
    fn test_record_without_type_defaults_to_info() {
        let record: NotificationRecord = serde_json::from_str(
            r#"{"id":"n1","message":"hello","createdAt":"2024-05-01T08:00:00Z"}"#,
        )
        .unwrap();
        let notification = record.normalize().unwrap();
        assert_eq!(notification.kind, NotificationKind::Info);
        assert!(!notification.read);
    }
}
