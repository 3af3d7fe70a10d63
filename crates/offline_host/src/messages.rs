//! Worker↔page message protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::queue::QueueEntrySummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
/// Worker→page message variants.
pub enum ClientMessageKind {
    /// A submission was queued for later delivery.
    UploadOffline,
    /// A submission, live or drained, was acknowledged by the server.
    UploadSuccess,
    /// A drain cycle started; pages should flush any queue state they hold.
    SyncUploads,
    /// Reply to [`PageMessage::ListQueue`].
    QueueSnapshot {
        /// Entries ordered oldest first.
        entries: Vec<QueueEntrySummary>,
    },
}

impl ClientMessageKind {
    /// Stable wire tag.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::UploadOffline => "upload-offline",
            Self::UploadSuccess => "upload-success",
            Self::SyncUploads => "sync-uploads",
            Self::QueueSnapshot { .. } => "queue-snapshot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Worker→page message: `{ "type": ..., "timestamp": ... }`.
pub struct ClientMessage {
    /// Message variant, flattened into the `type` tag.
    #[serde(flatten)]
    pub kind: ClientMessageKind,
    /// Emission time in unix milliseconds.
    pub timestamp: u64,
}

impl ClientMessage {
    /// Creates a message stamped at `timestamp`.
    pub fn new(kind: ClientMessageKind, timestamp: u64) -> Self {
        Self { kind, timestamp }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
/// Page→worker control messages.
pub enum PageMessage {
    /// Activate a waiting worker version immediately.
    SkipWaiting,
    /// Foreground asks for a drain now.
    SyncUploads,
    /// Foreground asks for the current queue contents.
    ListQueue,
    /// Content shared into the app from the OS share sheet.
    #[serde(alias = "SHARE_TARGET")]
    ShareTarget {
        /// Opaque share data.
        #[serde(default)]
        data: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// User-visible notification derived from a push payload.
pub struct Notification {
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Icon URL.
    pub icon: Option<String>,
    /// Badge URL.
    pub badge: Option<String>,
    /// Coalescing tag.
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::queue::QueueEntryStatus;

    #[test]
    fn client_message_wire_shape_is_type_and_timestamp() {
        let message = ClientMessage::new(ClientMessageKind::UploadOffline, 42);
        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({"type": "upload-offline", "timestamp": 42})
        );
        let decoded: ClientMessage =
            serde_json::from_value(json!({"type": "sync-uploads", "timestamp": 7}))
                .expect("deserialize");
        assert_eq!(decoded.kind, ClientMessageKind::SyncUploads);
        assert_eq!(decoded.kind.tag(), "sync-uploads");
    }

    #[test]
    fn queue_snapshot_carries_entries_beside_the_tag() {
        let message = ClientMessage::new(
            ClientMessageKind::QueueSnapshot {
                entries: vec![QueueEntrySummary {
                    id: "a".to_string(),
                    created_at_unix_ms: 1,
                    attempts: 0,
                    status: QueueEntryStatus::Pending,
                    filename: "capture.jpg".to_string(),
                    size_bytes: 10,
                }],
            },
            9,
        );
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["type"], json!("queue-snapshot"));
        assert_eq!(value["entries"][0]["status"], json!("pending"));
        assert_eq!(value["timestamp"], json!(9));
    }

    #[test]
    fn page_messages_parse_from_kebab_tags() {
        assert_eq!(
            serde_json::from_value::<PageMessage>(json!({"type": "skip-waiting"})).expect("skip"),
            PageMessage::SkipWaiting
        );
        assert_eq!(
            serde_json::from_value::<PageMessage>(json!({"type": "SHARE_TARGET"})).expect("share"),
            PageMessage::ShareTarget { data: Value::Null }
        );
        assert!(serde_json::from_value::<PageMessage>(json!({"type": "reboot"})).is_err());
    }
}
