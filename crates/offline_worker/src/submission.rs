//! Submission outcome classification and synthesized submission responses.

use offline_host::{FetchError, ResponseSnapshot};
use serde::{Deserialize, Serialize};

/// Message returned to the page when a submission could not reach the server.
pub const OFFLINE_SUBMISSION_MESSAGE: &str =
    "Upload failed - please check your connection and try again";
/// Message returned to the page when a submission was stored for later delivery.
pub const QUEUED_SUBMISSION_MESSAGE: &str =
    "You are offline. The upload was saved and will be sent when the connection returns.";

/// How a submission attempt ended, from the queue's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The server acknowledged the submission.
    Accepted(ResponseSnapshot),
    /// Connectivity failure; the submission may be retried later.
    Deferred(String),
    /// Application error; retrying would not help.
    Rejected(ResponseSnapshot),
}

/// Body of a synthesized `503` submission response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineSubmissionBody {
    /// Human-readable reason.
    pub error: String,
    /// Always `true`; the failure was a connectivity failure.
    pub offline: bool,
    /// Whether the payload was stored in the queue.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub queued: bool,
    /// Queue entry id when `queued`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OfflineFlags {
    #[serde(default)]
    offline: bool,
    #[serde(default)]
    queued: bool,
}

/// Classifies a live submission result.
///
/// Transport failures and `503` responses flagged `offline` or `queued` are connectivity-class;
/// `2xx` is acceptance; everything else is an application error.
pub fn classify_submission(result: Result<ResponseSnapshot, FetchError>) -> SubmissionOutcome {
    match result {
        Err(err) if err.is_connectivity() => SubmissionOutcome::Deferred(err.to_string()),
        Err(err) => SubmissionOutcome::Rejected(
            ResponseSnapshot::text(400, &err.to_string()).with_header("x-offline-worker", "rejected"),
        ),
        Ok(response) if response.is_success() => SubmissionOutcome::Accepted(response),
        Ok(response) if response.status == 503 && flags_offline(&response) => {
            SubmissionOutcome::Deferred(format!("server reported offline ({})", response.status))
        }
        Ok(response) => SubmissionOutcome::Rejected(response),
    }
}

fn flags_offline(response: &ResponseSnapshot) -> bool {
    response
        .json_body::<OfflineFlags>()
        .map(|flags| flags.offline || flags.queued)
        .unwrap_or(false)
}

/// Synthesized `503` telling the page its submission was queued as `entry_id`.
pub fn queued_response(entry_id: &str) -> ResponseSnapshot {
    offline_body_response(OfflineSubmissionBody {
        error: QUEUED_SUBMISSION_MESSAGE.to_string(),
        offline: true,
        queued: true,
        entry_id: Some(entry_id.to_string()),
    })
}

/// Synthesized `503` for a connectivity failure that could not be queued.
pub fn offline_response() -> ResponseSnapshot {
    offline_body_response(OfflineSubmissionBody {
        error: OFFLINE_SUBMISSION_MESSAGE.to_string(),
        offline: true,
        queued: false,
        entry_id: None,
    })
}

fn offline_body_response(body: OfflineSubmissionBody) -> ResponseSnapshot {
    match ResponseSnapshot::json(503, &body) {
        Ok(response) => response,
        // A plain struct of strings and bools always serializes.
        Err(_) => ResponseSnapshot::text(503, &body.error),
    }
}
