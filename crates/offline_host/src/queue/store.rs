//! Durable queue storage contract and adapters.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::Rc,
};

use super::QueueEntry;

/// Object-safe boxed future used by [`QueueStore`] async methods.
pub type QueueStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable storage for deferred submissions keyed by entry id.
///
/// Implementations must survive worker restarts; in-memory adapters exist only for tests and
/// unsupported targets.
pub trait QueueStore {
    /// Loads one entry by id.
    fn load_entry<'a>(
        &'a self,
        id: &'a str,
    ) -> QueueStoreFuture<'a, Result<Option<QueueEntry>, String>>;

    /// Inserts or replaces an entry.
    fn save_entry<'a>(&'a self, entry: &'a QueueEntry) -> QueueStoreFuture<'a, Result<(), String>>;

    /// Deletes an entry by id. Deleting a missing id succeeds.
    fn delete_entry<'a>(&'a self, id: &'a str) -> QueueStoreFuture<'a, Result<(), String>>;

    /// Lists every entry ordered by [`QueueEntry::sequence`].
    fn list_entries<'a>(&'a self) -> QueueStoreFuture<'a, Result<Vec<QueueEntry>, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op queue store; nothing is ever persisted.
pub struct NoopQueueStore;

impl QueueStore for NoopQueueStore {
    fn load_entry<'a>(
        &'a self,
        _id: &'a str,
    ) -> QueueStoreFuture<'a, Result<Option<QueueEntry>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_entry<'a>(&'a self, _entry: &'a QueueEntry) -> QueueStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_entry<'a>(&'a self, _id: &'a str) -> QueueStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn list_entries<'a>(&'a self) -> QueueStoreFuture<'a, Result<Vec<QueueEntry>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory queue store; clones share state, which stands in for durability across
/// worker instances in tests.
pub struct MemoryQueueStore {
    inner: Rc<RefCell<HashMap<String, QueueEntry>>>,
    failing_deletes: Rc<Cell<u32>>,
}

impl MemoryQueueStore {
    /// Makes the next `count` [`QueueStore::delete_entry`] calls fail.
    pub fn fail_next_deletes(&self, count: u32) {
        self.failing_deletes.set(count);
    }

    /// Number of stored entries regardless of status.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl QueueStore for MemoryQueueStore {
    fn load_entry<'a>(
        &'a self,
        id: &'a str,
    ) -> QueueStoreFuture<'a, Result<Option<QueueEntry>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(id).cloned()) })
    }

    fn save_entry<'a>(&'a self, entry: &'a QueueEntry) -> QueueStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(entry.id.clone(), entry.clone());
            Ok(())
        })
    }

    fn delete_entry<'a>(&'a self, id: &'a str) -> QueueStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let failing = self.failing_deletes.get();
            if failing > 0 {
                self.failing_deletes.set(failing - 1);
                return Err(format!("delete of {id} failed"));
            }
            self.inner.borrow_mut().remove(id);
            Ok(())
        })
    }

    fn list_entries<'a>(&'a self) -> QueueStoreFuture<'a, Result<Vec<QueueEntry>, String>> {
        Box::pin(async move {
            let mut entries = self.inner.borrow().values().cloned().collect::<Vec<_>>();
            entries.sort_by_key(|entry| entry.sequence);
            Ok(entries)
        })
    }
}
