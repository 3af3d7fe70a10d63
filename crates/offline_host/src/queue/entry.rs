//! Queue entry and submission payload types.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Schema version stamped on persisted queue entries.
pub const QUEUE_ENTRY_VERSION: u32 = 1;
/// Multipart field name the submission endpoint reads the image from.
pub const SUBMISSION_FIELD_NAME: &str = "image";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Lifecycle status of a deferred submission.
pub enum QueueEntryStatus {
    /// Waiting for the next drain.
    Pending,
    /// Currently being resubmitted.
    InFlight,
    /// Rejected by the server or out of attempts; never resubmitted automatically.
    Failed,
    /// Acknowledged by the server; removed right after.
    Done,
}

impl QueueEntryStatus {
    /// Stable string token used in logs and page snapshots.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in-flight",
            Self::Failed => "failed",
            Self::Done => "done",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One multipart file field captured from a submission.
pub struct SubmissionPayload {
    /// Form field name.
    pub field_name: String,
    /// Client-side filename.
    pub filename: String,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// Raw file bytes, base64 in serialized form.
    #[serde(serialize_with = "bytes_to_base64", deserialize_with = "bytes_from_base64")]
    pub bytes: Vec<u8>,
}

impl SubmissionPayload {
    /// Builds a payload for the standard image field.
    pub fn image(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field_name: SUBMISSION_FIELD_NAME.to_string(),
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for SubmissionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPayload")
            .field("field_name", &self.field_name)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn bytes_to_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn bytes_from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    STANDARD.decode(raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Persisted submission awaiting resubmission.
pub struct QueueEntry {
    /// Entry schema version.
    pub entry_version: u32,
    /// Unique entry id.
    pub id: String,
    /// Creation order; FIFO is defined by this value.
    pub sequence: u64,
    /// Creation time in unix milliseconds.
    pub created_at_unix_ms: u64,
    /// Resubmission attempts made so far.
    pub attempts: u32,
    /// Current status.
    pub status: QueueEntryStatus,
    /// Time of the last status change in unix milliseconds.
    pub status_changed_at_unix_ms: u64,
    /// Last classified failure, if any.
    pub last_error: Option<String>,
    /// The captured submission.
    pub payload: SubmissionPayload,
}

impl QueueEntry {
    /// Creates a `pending` entry with zero attempts.
    pub fn pending(
        id: impl Into<String>,
        sequence: u64,
        created_at_unix_ms: u64,
        payload: SubmissionPayload,
    ) -> Self {
        Self {
            entry_version: QUEUE_ENTRY_VERSION,
            id: id.into(),
            sequence,
            created_at_unix_ms,
            attempts: 0,
            status: QueueEntryStatus::Pending,
            status_changed_at_unix_ms: created_at_unix_ms,
            last_error: None,
            payload,
        }
    }

    /// Returns the byte-free view sent to pages.
    pub fn summary(&self) -> QueueEntrySummary {
        QueueEntrySummary {
            id: self.id.clone(),
            created_at_unix_ms: self.created_at_unix_ms,
            attempts: self.attempts,
            status: self.status,
            filename: self.payload.filename.clone(),
            size_bytes: self.payload.bytes.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Page-facing description of a queue entry.
pub struct QueueEntrySummary {
    /// Entry id.
    pub id: String,
    /// Creation time in unix milliseconds.
    pub created_at_unix_ms: u64,
    /// Resubmission attempts made so far.
    pub attempts: u32,
    /// Current status.
    pub status: QueueEntryStatus,
    /// Client-side filename.
    pub filename: String,
    /// Payload size.
    pub size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn queue_entry_serialization_shape_is_stable() {
        let entry = QueueEntry::pending(
            "e1",
            3,
            1_000,
            SubmissionPayload::image("capture.jpg", "image/jpeg", vec![0xff, 0xd8]),
        );
        let value = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(value["status"], json!("pending"));
        assert_eq!(value["sequence"], json!(3));
        assert_eq!(value["payload"]["field_name"], json!("image"));
        assert_eq!(value["payload"]["bytes"], json!("/9g="));

        let decoded: QueueEntry = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, entry);
    }

    #[test]
    fn in_flight_status_uses_kebab_case() {
        assert_eq!(
            serde_json::to_value(QueueEntryStatus::InFlight).expect("serialize"),
            json!("in-flight")
        );
        assert_eq!(QueueEntryStatus::InFlight.as_str(), "in-flight");
    }

    #[test]
    fn summary_omits_bytes() {
        let entry = QueueEntry::pending(
            "e2",
            1,
            5,
            SubmissionPayload::image("leaf.png", "image/png", vec![1, 2, 3]),
        );
        let summary = entry.summary();
        assert_eq!(summary.size_bytes, 3);
        assert_eq!(summary.filename, "leaf.png");
        assert!(format!("{:?}", entry.payload).contains("len: 3"));
    }

    #[test]
    fn invalid_base64_payload_is_rejected() {
        let err = serde_json::from_value::<SubmissionPayload>(json!({
            "field_name": "image",
            "filename": "x.jpg",
            "content_type": "image/jpeg",
            "bytes": "***",
        }))
        .expect_err("bad base64");
        assert!(!err.to_string().is_empty());
    }
}
