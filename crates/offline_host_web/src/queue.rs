//! IndexedDB-backed submission queue store implementation.

use offline_host::{QueueEntry, QueueStore, QueueStoreFuture};

#[derive(Debug, Clone, Copy, Default)]
/// Service-worker queue store backed by IndexedDB, keyed by entry id.
pub struct WebQueueStore;

impl QueueStore for WebQueueStore {
    fn load_entry<'a>(
        &'a self,
        id: &'a str,
    ) -> QueueStoreFuture<'a, Result<Option<QueueEntry>, String>> {
        Box::pin(async move { crate::bridge::queue_load(id).await })
    }

    fn save_entry<'a>(&'a self, entry: &'a QueueEntry) -> QueueStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::queue_save(entry).await })
    }

    fn delete_entry<'a>(&'a self, id: &'a str) -> QueueStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::queue_delete(id).await })
    }

    fn list_entries<'a>(&'a self) -> QueueStoreFuture<'a, Result<Vec<QueueEntry>, String>> {
        Box::pin(async move { crate::bridge::queue_list().await })
    }
}
