//! Versioned cache tiers: naming, lookup, install-time population, and activation cleanup.

use std::rc::Rc;

use log::{debug, info, warn};
use offline_host::{
    CacheKey, Clock, NetworkClient, OutgoingRequest, ResponseSnapshot, TierStore,
};

use crate::error::InstallError;
use crate::manifest::AssetManifest;

/// One of the three cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Install-time assets from the manifest.
    Static,
    /// Other GET responses.
    Dynamic,
    /// Analysis result images and uploaded originals.
    Results,
}

impl Tier {
    /// Stable token used in tier names and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Results => "results",
        }
    }
}

/// Concrete tier names for one worker version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierNames {
    /// Static tier name.
    pub static_tier: String,
    /// Dynamic tier name.
    pub dynamic_tier: String,
    /// Results tier name.
    pub results_tier: String,
}

impl TierNames {
    /// Builds `{prefix}-{tier}-v{version}` names.
    pub fn new(prefix: &str, version: &str) -> Self {
        let name = |tier: Tier| format!("{prefix}-{}-v{version}", tier.as_str());
        Self {
            static_tier: name(Tier::Static),
            dynamic_tier: name(Tier::Dynamic),
            results_tier: name(Tier::Results),
        }
    }

    /// Name of `tier`.
    pub fn name(&self, tier: Tier) -> &str {
        match tier {
            Tier::Static => &self.static_tier,
            Tier::Dynamic => &self.dynamic_tier,
            Tier::Results => &self.results_tier,
        }
    }

    /// Returns whether `name` belongs to this version.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_tier || name == self.dynamic_tier || name == self.results_tier
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Static tier that was populated.
    pub tier: String,
    /// Number of assets written.
    pub cached: usize,
}

/// Versioned view over a [`TierStore`] with the current version's tier names.
#[derive(Clone)]
pub struct TieredCache {
    store: Rc<dyn TierStore>,
    names: TierNames,
    clock: Rc<dyn Clock>,
}

impl TieredCache {
    /// Creates a cache over `store` for the tiers in `names`.
    pub fn new(store: Rc<dyn TierStore>, names: TierNames, clock: Rc<dyn Clock>) -> Self {
        Self {
            store,
            names,
            clock,
        }
    }

    /// Tier names of the current version.
    pub fn names(&self) -> &TierNames {
        &self.names
    }

    /// Opens `tier`, creating it empty when absent.
    ///
    /// # Errors
    ///
    /// Returns the storage error.
    pub async fn open(&self, tier: Tier) -> Result<(), String> {
        self.store.open(self.names.name(tier)).await
    }

    /// Looks `key` up in one tier. Storage failures are treated as misses.
    pub async fn match_in(&self, tier: Tier, key: &CacheKey) -> Option<ResponseSnapshot> {
        match self.store.match_entry(self.names.name(tier), key).await {
            Ok(hit) => hit,
            Err(err) => {
                warn!("{} tier read of {} failed: {err}", tier.as_str(), key.url());
                None
            }
        }
    }

    /// Looks `key` up across the current version's tiers: static, results, then dynamic.
    pub async fn match_request(&self, key: &CacheKey) -> Option<(Tier, ResponseSnapshot)> {
        for tier in [Tier::Static, Tier::Results, Tier::Dynamic] {
            if let Some(hit) = self.match_in(tier, key).await {
                return Some((tier, hit));
            }
        }
        None
    }

    /// Stores a timestamped copy of `response` under `key` in `tier`.
    ///
    /// # Errors
    ///
    /// Returns the storage error.
    pub async fn put(
        &self,
        tier: Tier,
        key: &CacheKey,
        response: &ResponseSnapshot,
    ) -> Result<(), String> {
        let stamped = response.clone().stamped(self.clock.now_unix_ms());
        self.store.put(self.names.name(tier), key, &stamped).await
    }

    /// Returns whether this version's static tier is present in storage.
    ///
    /// # Errors
    ///
    /// Returns the storage error.
    pub async fn is_installed(&self) -> Result<bool, String> {
        Ok(self
            .store
            .tier_names()
            .await?
            .iter()
            .any(|name| *name == self.names.static_tier))
    }

    /// Deletes a tier by name, current version or not.
    ///
    /// # Errors
    ///
    /// Returns the storage error.
    pub async fn delete_tier(&self, name: &str) -> Result<bool, String> {
        self.store.delete_tier(name).await
    }

    /// Populates the static tier from `manifest`, all or nothing.
    ///
    /// Every asset is fetched before anything is written, so a failed fetch leaves storage
    /// untouched. A failed write removes the static tier again unless it existed before.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or storage failure.
    pub async fn install(
        &self,
        manifest: &AssetManifest,
        network: &dyn NetworkClient,
    ) -> Result<InstallReport, InstallError> {
        let tier = self.names.static_tier.clone();
        let mut fetched = Vec::with_capacity(manifest.len());
        for key in manifest.assets() {
            let request = OutgoingRequest::get(key.url());
            let response =
                network
                    .fetch(&request)
                    .await
                    .map_err(|err| InstallError::AssetUnreachable {
                        url: key.url().to_string(),
                        reason: err.to_string(),
                    })?;
            if !response.is_cacheable() {
                return Err(InstallError::AssetStatus {
                    url: key.url().to_string(),
                    status: response.status,
                });
            }
            fetched.push((key, response));
        }

        let storage_error = |reason: String| InstallError::Storage {
            tier: tier.clone(),
            reason,
        };
        let existed = self
            .store
            .tier_names()
            .await
            .map_err(storage_error)?
            .contains(&tier);
        self.store.open(&tier).await.map_err(storage_error)?;

        for (key, response) in &fetched {
            if let Err(reason) = self.put(Tier::Static, key, response).await {
                if !existed {
                    if let Err(err) = self.store.delete_tier(&tier).await {
                        warn!("rollback of partial static tier {tier} failed: {err}");
                    }
                }
                return Err(storage_error(reason));
            }
            debug!("cached static asset {}", key.url());
        }

        info!("static tier {tier} populated with {} assets", fetched.len());
        Ok(InstallReport {
            tier,
            cached: fetched.len(),
        })
    }

    /// Deletes every tier that does not belong to the current version.
    ///
    /// # Errors
    ///
    /// Returns the storage error from listing; individual delete failures are logged and
    /// skipped so one stuck tier does not block activation.
    pub async fn activate(&self) -> Result<Vec<String>, String> {
        let mut deleted = Vec::new();
        for name in self.store.tier_names().await? {
            if self.names.is_current(&name) {
                continue;
            }
            match self.store.delete_tier(&name).await {
                Ok(_) => {
                    info!("deleted stale cache tier {name}");
                    deleted.push(name);
                }
                Err(err) => warn!("deleting stale cache tier {name} failed: {err}"),
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use offline_host::{FetchError, ManualClock, MemoryNetwork, MemoryTierStore, Method};
    use pretty_assertions::assert_eq;
    use url::Url;

    use super::*;

    fn cache(store: &MemoryTierStore, version: &str) -> TieredCache {
        TieredCache::new(
            Rc::new(store.clone()),
            TierNames::new("app", version),
            Rc::new(ManualClock::at(500)),
        )
    }

    fn manifest() -> AssetManifest {
        AssetManifest::new(
            "1",
            &["/".to_string(), "/app.css".to_string()],
            &Url::parse("https://app.local/").expect("scope"),
        )
        .expect("manifest")
    }

    fn key(url: &str) -> CacheKey {
        CacheKey::get(url).expect("key")
    }

    #[test]
    fn tier_names_are_prefixed_and_versioned() {
        let names = TierNames::new("pepperai", "2");
        assert_eq!(names.static_tier, "pepperai-static-v2");
        assert_eq!(names.name(Tier::Results), "pepperai-results-v2");
        assert!(names.is_current("pepperai-dynamic-v2"));
        assert!(!names.is_current("pepperai-dynamic-v1"));
    }

    #[test]
    fn install_populates_static_tier_with_stamped_snapshots() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        network.route_text("https://app.local/", "shell");
        network.route_text("https://app.local/app.css", "body{}");

        let report = block_on(cache(&store, "1").install(&manifest(), &network)).expect("install");
        assert_eq!(report.cached, 2);
        assert_eq!(
            store.urls("app-static-v1"),
            vec![
                "https://app.local/".to_string(),
                "https://app.local/app.css".to_string()
            ]
        );
        let hit = block_on(cache(&store, "1").match_in(Tier::Static, &key("https://app.local/")))
            .expect("hit");
        assert_eq!(hit.stored_at_unix_ms, Some(500));
    }

    #[test]
    fn install_writes_nothing_when_any_asset_fails() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        network.route_text("https://app.local/", "shell");
        network.script(
            Method::Get,
            "https://app.local/app.css",
            Err(FetchError::Unreachable("dns".to_string())),
        );

        let err = block_on(cache(&store, "1").install(&manifest(), &network)).expect_err("fail");
        assert!(matches!(err, InstallError::AssetUnreachable { ref url, .. } if url.ends_with("app.css")));
        assert_eq!(store.entry_count("app-static-v1"), None);
    }

    #[test]
    fn install_rejects_non_ok_assets() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        network.route_text("https://app.local/", "shell");

        let err = block_on(cache(&store, "1").install(&manifest(), &network)).expect_err("404");
        assert_eq!(
            err,
            InstallError::AssetStatus {
                url: "https://app.local/app.css".to_string(),
                status: 404
            }
        );
    }

    #[test]
    fn install_rolls_back_new_tier_on_write_failure() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        network.route_text("https://app.local/", "shell");
        network.route_text("https://app.local/app.css", "body{}");
        store.set_fail_writes(true);

        let err = block_on(cache(&store, "2").install(&manifest(), &network)).expect_err("quota");
        assert!(matches!(err, InstallError::Storage { .. }));
        assert_eq!(store.entry_count("app-static-v2"), None);
    }

    #[test]
    fn activate_deletes_only_foreign_tiers() {
        let store = MemoryTierStore::default();
        for name in ["app-static-v1", "app-dynamic-v1", "app-static-v2", "other-cache"] {
            block_on(store.open(name)).expect("open");
        }
        let current = cache(&store, "2");
        block_on(current.open(Tier::Results)).expect("open results");

        let mut deleted = block_on(current.activate()).expect("activate");
        deleted.sort();
        assert_eq!(
            deleted,
            vec![
                "app-dynamic-v1".to_string(),
                "app-static-v1".to_string(),
                "other-cache".to_string()
            ]
        );
        assert_eq!(
            block_on(store.tier_names()).expect("names"),
            vec!["app-results-v2".to_string(), "app-static-v2".to_string()]
        );
    }

    #[test]
    fn match_request_prefers_static_then_results_then_dynamic() {
        let store = MemoryTierStore::default();
        let tiers = cache(&store, "1");
        let shared = key("https://app.local/results/a.jpg");
        block_on(tiers.put(Tier::Dynamic, &shared, &ResponseSnapshot::text(200, "dynamic")))
            .expect("put");
        block_on(tiers.put(Tier::Results, &shared, &ResponseSnapshot::text(200, "results")))
            .expect("put");

        let (tier, hit) = block_on(tiers.match_request(&shared)).expect("hit");
        assert_eq!(tier, Tier::Results);
        assert_eq!(hit.body_text(), "results");
        assert!(block_on(tiers.match_request(&key("https://app.local/none"))).is_none());
    }

    #[test]
    fn is_installed_tracks_the_versions_static_tier() {
        let store = MemoryTierStore::default();
        let network = MemoryNetwork::default();
        network.route_text("https://app.local/", "shell");
        network.route_text("https://app.local/app.css", "body{}");

        assert!(!block_on(cache(&store, "1").is_installed()).expect("before"));
        block_on(cache(&store, "1").install(&manifest(), &network)).expect("install");
        assert!(block_on(cache(&store, "1").is_installed()).expect("after"));
        assert!(!block_on(cache(&store, "2").is_installed()).expect("other version"));
    }
}
