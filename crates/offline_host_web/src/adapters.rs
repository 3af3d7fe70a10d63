use std::rc::Rc;

use offline_host::{
    CacheKey, ClientChannel, ClientFuture, ClientMessage, FetchError, HostStrategy, NetworkClient,
    NetworkFuture, NoopClientChannel, NoopQueueStore, NoopTierStore, Notification,
    OfflineNetworkClient, OutgoingRequest, QueueEntry, QueueStore, QueueStoreFuture,
    ResponseSnapshot, SystemClock, TierStore, TierStoreFuture, WorkerServices,
};

use crate::{WebClientChannel, WebNetworkClient, WebQueueStore, WebTierStore};

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "worker-host-stub")]
    {
        HostStrategy::Stub
    }

    #[cfg(not(feature = "worker-host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    selected_host_strategy().as_str()
}

/// Adapter enum that erases the concrete cache backend behind [`TierStore`].
#[derive(Debug, Clone, Copy)]
pub enum TierStoreAdapter {
    /// Cache API tiers.
    Browser(WebTierStore),
    /// No-op fallback for builds without worker globals.
    Stub(NoopTierStore),
}

impl TierStore for TierStoreAdapter {
    fn open<'a>(&'a self, tier: &'a str) -> TierStoreFuture<'a, Result<(), String>> {
        match self {
            Self::Browser(store) => store.open(tier),
            Self::Stub(store) => store.open(tier),
        }
    }

    fn match_entry<'a>(
        &'a self,
        tier: &'a str,
        key: &'a CacheKey,
    ) -> TierStoreFuture<'a, Result<Option<ResponseSnapshot>, String>> {
        match self {
            Self::Browser(store) => store.match_entry(tier, key),
            Self::Stub(store) => store.match_entry(tier, key),
        }
    }

    fn put<'a>(
        &'a self,
        tier: &'a str,
        key: &'a CacheKey,
        response: &'a ResponseSnapshot,
    ) -> TierStoreFuture<'a, Result<(), String>> {
        match self {
            Self::Browser(store) => store.put(tier, key, response),
            Self::Stub(store) => store.put(tier, key, response),
        }
    }

    fn delete_tier<'a>(&'a self, tier: &'a str) -> TierStoreFuture<'a, Result<bool, String>> {
        match self {
            Self::Browser(store) => store.delete_tier(tier),
            Self::Stub(store) => store.delete_tier(tier),
        }
    }

    fn tier_names<'a>(&'a self) -> TierStoreFuture<'a, Result<Vec<String>, String>> {
        match self {
            Self::Browser(store) => store.tier_names(),
            Self::Stub(store) => store.tier_names(),
        }
    }
}

/// Adapter enum that erases the concrete queue backend behind [`QueueStore`].
#[derive(Debug, Clone, Copy)]
pub enum QueueStoreAdapter {
    /// IndexedDB queue.
    Browser(WebQueueStore),
    /// No-op fallback; nothing survives a restart.
    Stub(NoopQueueStore),
}

impl QueueStore for QueueStoreAdapter {
    fn load_entry<'a>(
        &'a self,
        id: &'a str,
    ) -> QueueStoreFuture<'a, Result<Option<QueueEntry>, String>> {
        match self {
            Self::Browser(store) => store.load_entry(id),
            Self::Stub(store) => store.load_entry(id),
        }
    }

    fn save_entry<'a>(&'a self, entry: &'a QueueEntry) -> QueueStoreFuture<'a, Result<(), String>> {
        match self {
            Self::Browser(store) => store.save_entry(entry),
            Self::Stub(store) => store.save_entry(entry),
        }
    }

    fn delete_entry<'a>(&'a self, id: &'a str) -> QueueStoreFuture<'a, Result<(), String>> {
        match self {
            Self::Browser(store) => store.delete_entry(id),
            Self::Stub(store) => store.delete_entry(id),
        }
    }

    fn list_entries<'a>(&'a self) -> QueueStoreFuture<'a, Result<Vec<QueueEntry>, String>> {
        match self {
            Self::Browser(store) => store.list_entries(),
            Self::Stub(store) => store.list_entries(),
        }
    }
}

/// Adapter enum that erases the concrete transport behind [`NetworkClient`].
#[derive(Debug, Clone, Copy)]
pub enum NetworkClientAdapter {
    /// Worker-global `fetch`.
    Browser(WebNetworkClient),
    /// Always-unreachable fallback.
    Stub(OfflineNetworkClient),
}

impl NetworkClient for NetworkClientAdapter {
    fn fetch<'a>(
        &'a self,
        request: &'a OutgoingRequest,
    ) -> NetworkFuture<'a, Result<ResponseSnapshot, FetchError>> {
        match self {
            Self::Browser(client) => client.fetch(request),
            Self::Stub(client) => client.fetch(request),
        }
    }
}

/// Adapter enum that erases the concrete page channel behind [`ClientChannel`].
#[derive(Debug, Clone, Copy)]
pub enum ClientChannelAdapter {
    /// `self.clients` and `self.registration`.
    Browser(WebClientChannel),
    /// Channel with no pages attached.
    Stub(NoopClientChannel),
}

impl ClientChannel for ClientChannelAdapter {
    fn broadcast<'a>(
        &'a self,
        message: &'a ClientMessage,
    ) -> ClientFuture<'a, Result<usize, String>> {
        match self {
            Self::Browser(channel) => channel.broadcast(message),
            Self::Stub(channel) => channel.broadcast(message),
        }
    }

    fn show_notification<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> ClientFuture<'a, Result<(), String>> {
        match self {
            Self::Browser(channel) => channel.show_notification(notification),
            Self::Stub(channel) => channel.show_notification(notification),
        }
    }

    fn open_window<'a>(&'a self, url: &'a str) -> ClientFuture<'a, Result<(), String>> {
        match self {
            Self::Browser(channel) => channel.open_window(url),
            Self::Stub(channel) => channel.open_window(url),
        }
    }
}

/// Builds the tier store for the selected strategy.
pub fn tier_store() -> TierStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => TierStoreAdapter::Browser(WebTierStore),
        HostStrategy::Memory | HostStrategy::Stub => TierStoreAdapter::Stub(NoopTierStore),
    }
}

/// Builds the queue store for the selected strategy.
pub fn queue_store() -> QueueStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => QueueStoreAdapter::Browser(WebQueueStore),
        HostStrategy::Memory | HostStrategy::Stub => QueueStoreAdapter::Stub(NoopQueueStore),
    }
}

/// Builds the network client for the selected strategy.
pub fn network_client() -> NetworkClientAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => NetworkClientAdapter::Browser(WebNetworkClient),
        HostStrategy::Memory | HostStrategy::Stub => {
            NetworkClientAdapter::Stub(OfflineNetworkClient)
        }
    }
}

/// Builds the page channel for the selected strategy.
pub fn client_channel() -> ClientChannelAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => ClientChannelAdapter::Browser(WebClientChannel),
        HostStrategy::Memory | HostStrategy::Stub => ClientChannelAdapter::Stub(NoopClientChannel),
    }
}

/// Builds the full service bundle handed to [`offline_worker::OfflineWorker::new`].
pub fn build_worker_services() -> WorkerServices {
    WorkerServices {
        tiers: Rc::new(tier_store()),
        queue: Rc::new(queue_store()),
        network: Rc::new(network_client()),
        clients: Rc::new(client_channel()),
        clock: Rc::new(SystemClock),
        host_strategy: selected_host_strategy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_name_matches_selected_strategy() {
        assert_eq!(host_strategy_name(), selected_host_strategy().as_str());
    }

    #[cfg(not(feature = "worker-host-stub"))]
    #[test]
    fn default_build_selects_browser_adapters() {
        assert_eq!(selected_host_strategy(), HostStrategy::Browser);
        assert!(matches!(tier_store(), TierStoreAdapter::Browser(_)));
        assert!(matches!(queue_store(), QueueStoreAdapter::Browser(_)));
        assert!(matches!(network_client(), NetworkClientAdapter::Browser(_)));
        assert!(matches!(client_channel(), ClientChannelAdapter::Browser(_)));
        assert_eq!(build_worker_services().host_strategy, HostStrategy::Browser);
    }

    #[cfg(feature = "worker-host-stub")]
    #[test]
    fn stub_feature_selects_noop_adapters() {
        assert_eq!(selected_host_strategy(), HostStrategy::Stub);
        assert!(matches!(tier_store(), TierStoreAdapter::Stub(_)));
        assert!(matches!(network_client(), NetworkClientAdapter::Stub(_)));
    }
}
