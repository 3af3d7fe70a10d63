//! Host service bundle injected into the worker.

use std::rc::Rc;

use crate::{
    Clock, ClientChannel, ManualClock, MemoryClientChannel, MemoryNetwork, MemoryQueueStore,
    MemoryTierStore, NetworkClient, QueueStore, TierStore,
};

/// Stable host strategy selected for the current composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Browser service-worker global scope.
    Browser,
    /// In-memory adapters for tests and native tooling.
    Memory,
    /// No-op adapters for targets without worker support.
    Stub,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Memory => "memory",
            Self::Stub => "stub",
        }
    }
}

/// Storage, transport, and messaging handles injected into one worker version.
///
/// All environment-specific adapter selection happens before this bundle reaches
/// `offline_worker`, so the state machine never touches ambient globals.
#[derive(Clone)]
pub struct WorkerServices {
    /// Named cache tiers.
    pub tiers: Rc<dyn TierStore>,
    /// Durable submission queue storage.
    pub queue: Rc<dyn QueueStore>,
    /// Network transport.
    pub network: Rc<dyn NetworkClient>,
    /// Page broadcast channel.
    pub clients: Rc<dyn ClientChannel>,
    /// Timestamp source.
    pub clock: Rc<dyn Clock>,
    /// Stable strategy identifier for diagnostics.
    pub host_strategy: HostStrategy,
}

/// In-memory host whose adapters stay inspectable after being handed to a worker.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    /// Cache tiers.
    pub tiers: MemoryTierStore,
    /// Queue storage.
    pub queue: MemoryQueueStore,
    /// Scriptable network.
    pub network: MemoryNetwork,
    /// Recording page channel.
    pub clients: MemoryClientChannel,
    /// Manual clock.
    pub clock: ManualClock,
}

impl MemoryHost {
    /// Creates a host whose clock starts at `now`.
    pub fn at(now: u64) -> Self {
        Self {
            clock: ManualClock::at(now),
            ..Self::default()
        }
    }

    /// Builds a service bundle sharing this host's adapters.
    pub fn services(&self) -> WorkerServices {
        WorkerServices {
            tiers: Rc::new(self.tiers.clone()),
            queue: Rc::new(self.queue.clone()),
            network: Rc::new(self.network.clone()),
            clients: Rc::new(self.clients.clone()),
            clock: Rc::new(self.clock.clone()),
            host_strategy: HostStrategy::Memory,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::{CacheKey, ResponseSnapshot};

    #[test]
    fn memory_host_services_share_state_with_host() {
        let host = MemoryHost::at(10);
        let services = host.services();
        let key = CacheKey::get("https://app.local/").expect("key");
        block_on(services.tiers.put("t", &key, &ResponseSnapshot::text(200, "x"))).expect("put");
        assert_eq!(host.tiers.entry_count("t"), Some(1));
        assert_eq!(services.clock.now_unix_ms(), 10);
        assert_eq!(services.host_strategy.as_str(), "memory");
    }
}
