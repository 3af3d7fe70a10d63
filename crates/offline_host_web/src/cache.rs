//! Cache API-backed tier store implementation.

use offline_host::{CacheKey, ResponseSnapshot, TierStore, TierStoreFuture};

#[derive(Debug, Clone, Copy, Default)]
/// Service-worker tier store backed by the Cache API; one cache per tier name.
pub struct WebTierStore;

impl TierStore for WebTierStore {
    fn open<'a>(&'a self, tier: &'a str) -> TierStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::tier_open(tier).await })
    }

    fn match_entry<'a>(
        &'a self,
        tier: &'a str,
        key: &'a CacheKey,
    ) -> TierStoreFuture<'a, Result<Option<ResponseSnapshot>, String>> {
        Box::pin(async move { crate::bridge::tier_match(tier, key.url()).await })
    }

    fn put<'a>(
        &'a self,
        tier: &'a str,
        key: &'a CacheKey,
        response: &'a ResponseSnapshot,
    ) -> TierStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::tier_put(tier, key.url(), response).await })
    }

    fn delete_tier<'a>(&'a self, tier: &'a str) -> TierStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move { crate::bridge::tier_delete(tier).await })
    }

    fn tier_names<'a>(&'a self) -> TierStoreFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async move { crate::bridge::tier_names().await })
    }
}
