//! Named cache-tier storage contracts and adapters.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use crate::http::{CacheKey, ResponseSnapshot};

/// Object-safe boxed future used by [`TierStore`] async methods.
pub type TierStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host storage holding response snapshots in independently named tiers.
///
/// Writes to the same key are last-writer-wins; implementations never merge entries.
pub trait TierStore {
    /// Opens `tier`, creating it empty when absent.
    fn open<'a>(&'a self, tier: &'a str) -> TierStoreFuture<'a, Result<(), String>>;

    /// Reads the snapshot stored under `key` in `tier`.
    fn match_entry<'a>(
        &'a self,
        tier: &'a str,
        key: &'a CacheKey,
    ) -> TierStoreFuture<'a, Result<Option<ResponseSnapshot>, String>>;

    /// Stores `response` under `key` in `tier`, creating the tier lazily.
    fn put<'a>(
        &'a self,
        tier: &'a str,
        key: &'a CacheKey,
        response: &'a ResponseSnapshot,
    ) -> TierStoreFuture<'a, Result<(), String>>;

    /// Deletes a whole tier. Resolves to `true` when the tier existed.
    fn delete_tier<'a>(&'a self, tier: &'a str) -> TierStoreFuture<'a, Result<bool, String>>;

    /// Lists the names of every existing tier.
    fn tier_names<'a>(&'a self) -> TierStoreFuture<'a, Result<Vec<String>, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op tier store for unsupported targets; every lookup misses.
pub struct NoopTierStore;

impl TierStore for NoopTierStore {
    fn open<'a>(&'a self, _tier: &'a str) -> TierStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn match_entry<'a>(
        &'a self,
        _tier: &'a str,
        _key: &'a CacheKey,
    ) -> TierStoreFuture<'a, Result<Option<ResponseSnapshot>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn put<'a>(
        &'a self,
        _tier: &'a str,
        _key: &'a CacheKey,
        _response: &'a ResponseSnapshot,
    ) -> TierStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_tier<'a>(&'a self, _tier: &'a str) -> TierStoreFuture<'a, Result<bool, String>> {
        Box::pin(async { Ok(false) })
    }

    fn tier_names<'a>(&'a self) -> TierStoreFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory tier store; clones share the same tiers.
pub struct MemoryTierStore {
    tiers: Rc<RefCell<BTreeMap<String, HashMap<CacheKey, ResponseSnapshot>>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryTierStore {
    /// Makes every subsequent [`TierStore::put`] fail, simulating a full quota.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Returns the number of entries in `tier`, or `None` when the tier does not exist.
    pub fn entry_count(&self, tier: &str) -> Option<usize> {
        self.tiers.borrow().get(tier).map(HashMap::len)
    }

    /// Returns the normalized URLs stored in `tier`, sorted.
    pub fn urls(&self, tier: &str) -> Vec<String> {
        let mut urls = self
            .tiers
            .borrow()
            .get(tier)
            .map(|entries| {
                entries
                    .keys()
                    .map(|key| key.url().to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        urls.sort();
        urls
    }
}

impl TierStore for MemoryTierStore {
    fn open<'a>(&'a self, tier: &'a str) -> TierStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.tiers.borrow_mut().entry(tier.to_string()).or_default();
            Ok(())
        })
    }

    fn match_entry<'a>(
        &'a self,
        tier: &'a str,
        key: &'a CacheKey,
    ) -> TierStoreFuture<'a, Result<Option<ResponseSnapshot>, String>> {
        Box::pin(async move {
            Ok(self
                .tiers
                .borrow()
                .get(tier)
                .and_then(|entries| entries.get(key))
                .cloned())
        })
    }

    fn put<'a>(
        &'a self,
        tier: &'a str,
        key: &'a CacheKey,
        response: &'a ResponseSnapshot,
    ) -> TierStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            if self.fail_writes.get() {
                return Err(format!("quota exceeded writing {} into {tier}", key.url()));
            }
            self.tiers
                .borrow_mut()
                .entry(tier.to_string())
                .or_default()
                .insert(key.clone(), response.clone());
            Ok(())
        })
    }

    fn delete_tier<'a>(&'a self, tier: &'a str) -> TierStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move { Ok(self.tiers.borrow_mut().remove(tier).is_some()) })
    }

    fn tier_names<'a>(&'a self) -> TierStoreFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async move { Ok(self.tiers.borrow().keys().cloned().collect()) })
    }
}
