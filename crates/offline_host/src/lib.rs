//! Typed host-domain contracts and shared models for the offline cache-and-sync worker.
//!
//! This crate is the API-first boundary between the worker state machine in `offline_worker`
//! and the environment it runs in. It exposes request/response snapshots, the queue entry model,
//! the worker↔page message protocol, and object-safe service traits for cache tiers, queue
//! storage, network transport, page messaging, and time. Browser adapters live in
//! `offline_host_web`; the memory adapters here back tests and native tooling.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod clients;
pub mod clock;
pub mod host;
pub mod http;
pub mod messages;
pub mod network;
pub mod queue;

pub use cache::{MemoryTierStore, NoopTierStore, TierStore, TierStoreFuture};
pub use clients::{ClientChannel, ClientFuture, MemoryClientChannel, NoopClientChannel};
pub use clock::{unix_time_ms_now, Clock, ManualClock, SystemClock};
pub use host::{HostStrategy, MemoryHost, WorkerServices};
pub use http::{CacheKey, Method, OutgoingRequest, RequestBody, RequestMode, ResponseSnapshot};
pub use messages::{ClientMessage, ClientMessageKind, Notification, PageMessage};
pub use network::{FetchError, MemoryNetwork, NetworkClient, NetworkFuture, OfflineNetworkClient};
pub use queue::{
    MemoryQueueStore, NoopQueueStore, QueueEntry, QueueEntryStatus, QueueEntrySummary,
    QueueStore, QueueStoreFuture, SubmissionPayload, QUEUE_ENTRY_VERSION, SUBMISSION_FIELD_NAME,
};
