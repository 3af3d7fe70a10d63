//! Cache-tier contracts and lightweight test adapters.

mod tier_store;

pub use tier_store::{MemoryTierStore, NoopTierStore, TierStore, TierStoreFuture};
