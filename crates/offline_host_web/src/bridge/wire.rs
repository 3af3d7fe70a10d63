//! JS-facing shapes exchanged with the inline bridge script.
//!
//! Bodies travel separately as `Uint8Array`s; these heads carry everything else.

use offline_host::{
    FetchError, Method, OutgoingRequest, RequestBody, RequestMode, ResponseSnapshot,
    SubmissionPayload,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseHead {
    pub status: u16,
    pub status_text: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub stored_at_unix_ms: Option<u64>,
}

impl ResponseHead {
    pub fn from_snapshot(snapshot: &ResponseSnapshot) -> Self {
        Self {
            status: snapshot.status,
            status_text: snapshot.status_text.clone(),
            headers: snapshot.headers.clone(),
            stored_at_unix_ms: snapshot.stored_at_unix_ms,
        }
    }

    pub fn into_snapshot(self, body: Vec<u8>) -> ResponseSnapshot {
        ResponseSnapshot {
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            body,
            stored_at_unix_ms: self.stored_at_unix_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionHead {
    pub field_name: String,
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestHead {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub submission: Option<SubmissionHead>,
}

impl RequestHead {
    /// Splits `request` into a head and the raw body bytes.
    pub fn from_request(request: &OutgoingRequest) -> (Self, Option<Vec<u8>>) {
        let (submission, body) = match &request.body {
            Some(RequestBody::Submission(payload)) => (
                Some(SubmissionHead {
                    field_name: payload.field_name.clone(),
                    filename: payload.filename.clone(),
                    content_type: payload.content_type.clone(),
                }),
                Some(payload.bytes.clone()),
            ),
            Some(RequestBody::Bytes(bytes)) => (None, Some(bytes.clone())),
            None => (None, None),
        };
        let mode = if request.is_navigation() { "navigate" } else { "subresource" };
        (
            Self {
                method: request.method.as_str().to_string(),
                url: request.url.clone(),
                mode: mode.to_string(),
                headers: request.headers.clone(),
                submission,
            },
            body,
        )
    }

    pub fn into_request(self, body: Option<Vec<u8>>) -> OutgoingRequest {
        let body = match (self.submission, body) {
            (Some(head), Some(bytes)) => Some(RequestBody::Submission(SubmissionPayload {
                field_name: head.field_name,
                filename: head.filename,
                content_type: head.content_type,
                bytes,
            })),
            (None, Some(bytes)) => Some(RequestBody::Bytes(bytes)),
            (_, None) => None,
        };
        OutgoingRequest {
            method: Method::parse(&self.method),
            url: self.url,
            mode: if self.mode == "navigate" {
                RequestMode::Navigate
            } else {
                RequestMode::Subresource
            },
            headers: self.headers,
            body,
        }
    }
}

/// `Clients.matchAll` options used for worker-to-page broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClientQuery {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub include_uncontrolled: bool,
}

impl ClientQuery {
    /// Window clients this worker controls; pages still on another version are skipped.
    pub const CONTROLLED_WINDOWS: Self = Self {
        kind: "window",
        include_uncontrolled: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub(crate) enum FetchFailure {
    Unreachable { message: String },
    Aborted { message: String },
    Invalid { message: String },
}

impl From<FetchFailure> for FetchError {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::Unreachable { message } => Self::Unreachable(message),
            FetchFailure::Aborted { message } => Self::Aborted(message),
            FetchFailure::Invalid { message } => Self::InvalidRequest(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn submission_request_splits_payload_bytes_from_head() {
        let request = OutgoingRequest::submission(
            "https://app.local/upload",
            SubmissionPayload::image("capture.jpg", "image/jpeg", vec![0xff, 0xd8]),
        );
        let (head, body) = RequestHead::from_request(&request);
        assert_eq!(
            serde_json::to_value(&head).expect("json"),
            json!({
                "method": "POST",
                "url": "https://app.local/upload",
                "mode": "subresource",
                "headers": [],
                "submission": {
                    "fieldName": "image",
                    "filename": "capture.jpg",
                    "contentType": "image/jpeg"
                }
            })
        );
        assert_eq!(head.into_request(body), request);
    }

    #[test]
    fn navigation_head_from_browser_parses() {
        let head: RequestHead = serde_json::from_value(json!({
            "method": "GET",
            "url": "https://app.local/history",
            "mode": "navigate",
            "headers": [["accept", "text/html"]]
        }))
        .expect("head");
        let request = head.into_request(None);
        assert!(request.is_navigation());
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.headers, vec![("accept".to_string(), "text/html".to_string())]);
    }

    #[test]
    fn response_head_keeps_storage_stamp() {
        let snapshot = ResponseSnapshot::text(200, "ok").stamped(42);
        let head = ResponseHead::from_snapshot(&snapshot);
        assert_eq!(head.stored_at_unix_ms, Some(42));
        assert_eq!(head.into_snapshot(b"ok".to_vec()), snapshot);
    }

    #[test]
    fn failure_kinds_map_to_fetch_errors() {
        let failure: FetchFailure =
            serde_json::from_value(json!({"kind": "aborted", "message": "AbortError"}))
                .expect("failure");
        assert_eq!(
            FetchError::from(failure),
            FetchError::Aborted("AbortError".to_string())
        );
    }

    #[test]
    fn broadcast_query_targets_controlled_windows_only() {
        assert_eq!(
            serde_json::to_value(ClientQuery::CONTROLLED_WINDOWS).expect("json"),
            json!({"type": "window", "includeUncontrolled": false})
        );
    }
}
