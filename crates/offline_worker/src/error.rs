//! Error types for worker configuration, lifecycle, and queue operations.

use offline_host::QueueEntryStatus;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Configuration failures.
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("worker config parse failed: {0}")]
    Parse(String),
    /// The document parsed but violates an invariant.
    #[error("invalid worker config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Install-phase failures. Any of these aborts the new version.
pub enum InstallError {
    /// An asset could not be fetched at all.
    #[error("asset {url} unreachable: {reason}")]
    AssetUnreachable {
        /// Asset URL.
        url: String,
        /// Transport failure.
        reason: String,
    },
    /// An asset responded with a non-`200` status.
    #[error("asset {url} responded {status}")]
    AssetStatus {
        /// Asset URL.
        url: String,
        /// Received status.
        status: u16,
    },
    /// The static tier could not be written.
    #[error("static tier {tier} write failed: {reason}")]
    Storage {
        /// Tier name.
        tier: String,
        /// Storage failure.
        reason: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Submission queue failures.
pub enum QueueError {
    /// The durable store failed.
    #[error("queue storage failed: {0}")]
    Storage(String),
    /// No entry with the id exists.
    #[error("queue entry {0} not found")]
    NotFound(String),
    /// Another entry is already being resubmitted.
    #[error("queue entry {0} is already in flight")]
    AlreadyInFlight(String),
    /// The requested status change is not allowed.
    #[error("queue entry {id} cannot move from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        /// Entry id.
        id: String,
        /// Current status.
        from: QueueEntryStatus,
        /// Requested status.
        to: QueueEntryStatus,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Top-level worker failures surfaced to the host adapter.
pub enum WorkerError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Install aborted.
    #[error(transparent)]
    Install(#[from] InstallError),
    /// Queue operation failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// Cache tier storage failed outside install.
    #[error("cache storage failed: {0}")]
    Storage(String),
    /// The worker scope URL is unusable.
    #[error("invalid worker scope `{0}`")]
    InvalidScope(String),
    /// The event arrived in a lifecycle state that cannot handle it.
    #[error("cannot {event} while {state}")]
    Lifecycle {
        /// Event name.
        event: &'static str,
        /// Current lifecycle state.
        state: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_uses_wire_tokens() {
        let err = QueueError::InvalidTransition {
            id: "e1".to_string(),
            from: QueueEntryStatus::Failed,
            to: QueueEntryStatus::InFlight,
        };
        assert_eq!(err.to_string(), "queue entry e1 cannot move from failed to in-flight");
    }

    #[test]
    fn worker_error_wraps_install_failures_transparently() {
        let err: WorkerError = InstallError::AssetStatus {
            url: "https://app.local/app.css".to_string(),
            status: 404,
        }
        .into();
        assert_eq!(err.to_string(), "asset https://app.local/app.css responded 404");
    }
}
