//! Cache-and-sync state machine for the offline worker.
//!
//! [`OfflineWorker`] exposes one async method per host event (`install`, `activate`, `fetch`,
//! `sync`, `periodic_sync`, `online`, `message`, `push`, `notification_click`). Everything it
//! touches arrives through [`offline_host::WorkerServices`], so the same state machine runs in a
//! browser service worker and against the in-memory adapters in tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod interceptor;
pub mod lifecycle;
pub mod manifest;
pub mod notifier;
pub mod queue;
pub mod routing;
pub mod strategy;
pub mod submission;
pub mod tiers;
pub mod worker;

pub use config::{
    AssetsConfig, NotificationsConfig, RoutesConfig, SyncConfig, WorkerConfig,
    EMBEDDED_WORKER_CONFIG,
};
pub use coordinator::{DrainOutcome, DrainReport, SyncCoordinator, SyncState, SyncTrigger};
pub use error::{ConfigError, InstallError, QueueError, WorkerError};
pub use interceptor::{FetchDisposition, Interceptor, OFFLINE_FALLBACK_TEXT};
pub use lifecycle::{LifecycleEvent, WorkerLifecycle};
pub use manifest::AssetManifest;
pub use notifier::ClientNotifier;
pub use queue::{QueueSummary, Recovery, SubmissionQueue};
pub use routing::{Route, RouteTable};
pub use strategy::{cache_first, network_first, ResponseSource, Served};
pub use submission::{
    classify_submission, offline_response, queued_response, OfflineSubmissionBody,
    SubmissionOutcome,
};
pub use tiers::{InstallReport, Tier, TierNames, TieredCache};
pub use worker::OfflineWorker;
