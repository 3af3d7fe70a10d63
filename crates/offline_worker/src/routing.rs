//! Request classification into cache strategies.

use offline_host::{CacheKey, Method, OutgoingRequest};
use url::{Origin, Url};

use crate::config::RoutesConfig;
use crate::manifest::AssetManifest;
use crate::tiers::Tier;

/// Disposition chosen for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Manifest asset: cache-first on the static tier.
    StaticAsset(CacheKey),
    /// Analysis output: cache-first on the results tier.
    ResultAsset(CacheKey),
    /// Any other GET: network-first with dynamic-tier fallback.
    Dynamic(CacheKey),
    /// Image submission: passthrough, queued on connectivity failure.
    Submission,
    /// Not handled by the worker.
    Bypass,
}

impl Route {
    /// Tier this route reads from and writes to.
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Self::StaticAsset(_) => Some(Tier::Static),
            Self::ResultAsset(_) => Some(Tier::Results),
            Self::Dynamic(_) => Some(Tier::Dynamic),
            Self::Submission | Self::Bypass => None,
        }
    }
}

/// Routing rules for one worker version.
#[derive(Debug, Clone)]
pub struct RouteTable {
    origin: Origin,
    manifest: AssetManifest,
    submission_path: String,
    results_prefixes: Vec<String>,
}

impl RouteTable {
    /// Builds routing rules for pages under `scope`.
    pub fn new(scope: &Url, manifest: AssetManifest, routes: &RoutesConfig) -> Self {
        Self {
            origin: scope.origin(),
            manifest,
            submission_path: routes.submission_path.clone(),
            results_prefixes: routes.results_prefixes.clone(),
        }
    }

    /// Offline asset manifest.
    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    /// Classifies `request` by method, origin, and path.
    pub fn classify(&self, request: &OutgoingRequest) -> Route {
        let Ok(url) = request.parsed_url() else {
            return Route::Bypass;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return Route::Bypass;
        }
        let same_origin = url.origin() == self.origin;

        match request.method {
            Method::Post if same_origin && url.path() == self.submission_path => Route::Submission,
            Method::Get => {
                let Ok(key) = CacheKey::get(url.as_str()) else {
                    return Route::Bypass;
                };
                if self.manifest.contains(&key) {
                    Route::StaticAsset(key)
                } else if same_origin
                    && self
                        .results_prefixes
                        .iter()
                        .any(|prefix| url.path().starts_with(prefix.as_str()))
                {
                    Route::ResultAsset(key)
                } else {
                    Route::Dynamic(key)
                }
            }
            _ => Route::Bypass,
        }
    }
}
