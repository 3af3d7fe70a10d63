//! GET caching strategies.

use log::{debug, warn};
use offline_host::{CacheKey, FetchError, NetworkClient, OutgoingRequest, ResponseSnapshot};

use crate::tiers::{Tier, TieredCache};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Read from a cache tier.
    Cache(Tier),
    /// Fetched from the network.
    Network,
}

/// A response chosen by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    /// Response to hand to the page.
    pub response: ResponseSnapshot,
    /// Origin of the response.
    pub source: ResponseSource,
}

/// Serves `key` from `tier`, falling back to the network and caching `200` responses in `tier`.
///
/// # Errors
///
/// Returns the transport failure on a cache miss while the network is unreachable.
pub async fn cache_first(
    tiers: &TieredCache,
    tier: Tier,
    key: &CacheKey,
    request: &OutgoingRequest,
    network: &dyn NetworkClient,
) -> Result<Served, FetchError> {
    if let Some(response) = tiers.match_in(tier, key).await {
        debug!("{} hit {}", tier.as_str(), key.url());
        return Ok(Served {
            response,
            source: ResponseSource::Cache(tier),
        });
    }
    debug!("{} miss {}", tier.as_str(), key.url());
    let response = network.fetch(request).await?;
    store(tiers, tier, key, &response).await;
    Ok(Served {
        response,
        source: ResponseSource::Network,
    })
}

/// Fetches `key` from the network, caching `200` responses in the dynamic tier and falling back
/// to it when the network fails.
///
/// # Errors
///
/// Returns the transport failure when the dynamic tier has no copy either.
pub async fn network_first(
    tiers: &TieredCache,
    key: &CacheKey,
    request: &OutgoingRequest,
    network: &dyn NetworkClient,
) -> Result<Served, FetchError> {
    match network.fetch(request).await {
        Ok(response) => {
            store(tiers, Tier::Dynamic, key, &response).await;
            Ok(Served {
                response,
                source: ResponseSource::Network,
            })
        }
        Err(err) => match tiers.match_in(Tier::Dynamic, key).await {
            Some(response) => {
                debug!("network failed for {}, serving dynamic copy", key.url());
                Ok(Served {
                    response,
                    source: ResponseSource::Cache(Tier::Dynamic),
                })
            }
            None => Err(err),
        },
    }
}

async fn store(tiers: &TieredCache, tier: Tier, key: &CacheKey, response: &ResponseSnapshot) {
    if !response.is_cacheable() {
        return;
    }
    if let Err(err) = tiers.put(tier, key, response).await {
        warn!("caching {} in {} tier failed: {err}", key.url(), tier.as_str());
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use offline_host::{ManualClock, MemoryNetwork, MemoryTierStore, Method};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tiers::TierNames;

    const URL: &str = "https://app.local/history";

    fn tiers(store: &MemoryTierStore) -> TieredCache {
        TieredCache::new(
            Rc::new(store.clone()),
            TierNames::new("app", "1"),
            Rc::new(ManualClock::at(1)),
        )
    }

    fn key() -> CacheKey {
        CacheKey::get(URL).expect("key")
    }

    #[test]
    fn cache_first_fetches_once_then_serves_from_tier() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        network.route_text(URL, "v1");
        let tiers = tiers(&store);
        let request = OutgoingRequest::get(URL);

        let first = block_on(cache_first(&tiers, Tier::Results, &key(), &request, &network))
            .expect("first");
        assert_eq!(first.source, ResponseSource::Network);
        let second = block_on(cache_first(&tiers, Tier::Results, &key(), &request, &network))
            .expect("second");
        assert_eq!(second.source, ResponseSource::Cache(Tier::Results));
        assert_eq!(second.response.body_text(), "v1");
        assert_eq!(network.request_count(&Method::Get, URL), 1);
    }

    #[test]
    fn cache_first_does_not_store_errors() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        let tiers = tiers(&store);

        let served = block_on(cache_first(
            &tiers,
            Tier::Results,
            &key(),
            &OutgoingRequest::get(URL),
            &network,
        ))
        .expect("404 is a response");
        assert_eq!(served.response.status, 404);
        assert_eq!(store.entry_count("app-results-v1"), None);
    }

    #[test]
    fn network_first_refreshes_and_falls_back_to_dynamic_copy() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        network.route_text(URL, "fresh");
        let tiers = tiers(&store);
        let request = OutgoingRequest::get(URL);

        let online = block_on(network_first(&tiers, &key(), &request, &network)).expect("online");
        assert_eq!(online.source, ResponseSource::Network);

        network.set_online(false);
        let offline = block_on(network_first(&tiers, &key(), &request, &network)).expect("cached");
        assert_eq!(offline.source, ResponseSource::Cache(Tier::Dynamic));
        assert_eq!(offline.response.body_text(), "fresh");
    }

    #[test]
    fn network_first_surfaces_failure_without_copy() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        network.set_online(false);

        let err = block_on(network_first(
            &tiers(&store),
            &key(),
            &OutgoingRequest::get(URL),
            &network,
        ))
        .expect_err("offline miss");
        assert!(err.is_connectivity());
    }
}
