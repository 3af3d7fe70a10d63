//! Browser service-worker host for the offline cache-and-sync worker.
//!
//! This crate implements the [`offline_host`] contracts over the worker global scope and exposes
//! [`ServiceWorkerHost`] to the bootstrap script on `wasm32`.
//!
//! Bridge bindings are split by domain under `bridge/`:
//! - `bridge::cache` (Cache API tiers)
//! - `bridge::queue` (IndexedDB submission queue)
//! - `bridge::network` (`fetch`)
//! - `bridge::clients` (`Clients`, notifications, windows)
//! - `bridge::interop` (shared wasm/non-wasm transport glue)

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
pub mod boot;
mod bridge;
pub mod cache;
pub mod clients;
pub mod logging;
pub mod network;
pub mod queue;
#[cfg(target_arch = "wasm32")]
pub mod worker_host;

pub use adapters::{
    build_worker_services, client_channel, host_strategy_name, network_client, queue_store,
    selected_host_strategy, tier_store, ClientChannelAdapter, NetworkClientAdapter,
    QueueStoreAdapter, TierStoreAdapter,
};
pub use boot::{start_worker, DrainSummary};
pub use cache::WebTierStore;
pub use clients::WebClientChannel;
pub use logging::{init_logging, ConsoleLogger};
pub use network::WebNetworkClient;
pub use queue::WebQueueStore;
#[cfg(target_arch = "wasm32")]
pub use worker_host::ServiceWorkerHost;
