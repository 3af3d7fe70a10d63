//! Worker composition shared by the wasm entry point and native checks.

use log::info;
use offline_worker::{DrainReport, OfflineWorker, WorkerConfig, WorkerError};
use serde::Serialize;

use crate::adapters::build_worker_services;

/// Parses `config_toml` (or the embedded document) and binds a worker to the selected adapters.
///
/// # Errors
///
/// Returns [`WorkerError::Config`] for a rejected document and
/// [`WorkerError::InvalidScope`] for an unusable scope.
pub fn start_worker(scope: &str, config_toml: Option<&str>) -> Result<OfflineWorker, WorkerError> {
    let config = match config_toml {
        Some(raw) => WorkerConfig::from_toml_str(raw)?,
        None => WorkerConfig::embedded()?,
    };
    let worker = OfflineWorker::new(config, scope, build_worker_services())?;
    info!(
        "offline worker {} started on {} host",
        worker.config().version,
        worker.host_strategy().as_str()
    );
    Ok(worker)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// JS-facing view of a drain cycle.
pub struct DrainSummary {
    /// Trigger token.
    pub trigger: &'static str,
    /// Outcome token.
    pub outcome: &'static str,
    /// Entries acknowledged.
    pub submitted: usize,
    /// Entries marked failed.
    pub failed: usize,
    /// Entries still pending.
    pub remaining: usize,
}

impl From<&DrainReport> for DrainSummary {
    fn from(report: &DrainReport) -> Self {
        Self {
            trigger: report.trigger.as_str(),
            outcome: report.outcome.as_str(),
            submitted: report.submitted,
            failed: report.failed,
            remaining: report.remaining,
        }
    }
}
