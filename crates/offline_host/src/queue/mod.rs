//! Durable submission-queue contracts, entry types, and adapters.

mod entry;
mod store;

pub use entry::{
    QueueEntry, QueueEntryStatus, QueueEntrySummary, SubmissionPayload, QUEUE_ENTRY_VERSION,
    SUBMISSION_FIELD_NAME,
};
pub use store::{MemoryQueueStore, NoopQueueStore, QueueStore, QueueStoreFuture};
