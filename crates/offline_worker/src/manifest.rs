//! Offline asset manifest resolved against the worker scope.

use std::collections::BTreeSet;

use offline_host::CacheKey;
use url::Url;

use crate::error::ConfigError;

/// Versioned set of assets that must resolve during install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    version: String,
    assets: Vec<CacheKey>,
    index: BTreeSet<CacheKey>,
}

impl AssetManifest {
    /// Resolves `files` (absolute paths or URLs) against `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an entry does not resolve to an absolute URL.
    pub fn new(version: &str, files: &[String], scope: &Url) -> Result<Self, ConfigError> {
        let mut assets = Vec::with_capacity(files.len());
        let mut index = BTreeSet::new();
        for file in files {
            let resolved = scope
                .join(file)
                .map_err(|e| ConfigError::Invalid(format!("asset `{file}`: {e}")))?;
            let key = CacheKey::get(resolved.as_str()).map_err(ConfigError::Invalid)?;
            if index.insert(key.clone()) {
                assets.push(key);
            }
        }
        Ok(Self {
            version: version.to_string(),
            assets,
            index,
        })
    }

    /// Manifest version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resolved asset keys in manifest order.
    pub fn assets(&self) -> &[CacheKey] {
        &self.assets
    }

    /// Returns whether `key` is an offline asset.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.index.contains(key)
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns whether the manifest lists no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Url {
        Url::parse("https://app.local/").expect("scope")
    }

    #[test]
    fn resolves_paths_and_keeps_cross_origin_urls() {
        let manifest = AssetManifest::new(
            "1",
            &[
                "/".to_string(),
                "/static/app.css".to_string(),
                "https://fonts.example/css?family=Inter".to_string(),
            ],
            &scope(),
        )
        .expect("manifest");

        let urls = manifest
            .assets()
            .iter()
            .map(|key| key.url().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            urls,
            vec![
                "https://app.local/".to_string(),
                "https://app.local/static/app.css".to_string(),
                "https://fonts.example/css?family=Inter".to_string(),
            ]
        );
        assert!(manifest.contains(&CacheKey::get("https://app.local/static/app.css#x").expect("key")));
        assert!(!manifest.contains(&CacheKey::get("https://app.local/static/app.js").expect("key")));
        assert!(!manifest.contains(&CacheKey::get("https://app.local/?utm=1").expect("key")));
    }

    #[test]
    fn root_entry_does_not_match_every_path() {
        let manifest = AssetManifest::new("1", &["/".to_string()], &scope()).expect("manifest");
        assert!(!manifest.contains(&CacheKey::get("https://app.local/history").expect("key")));
        assert_eq!(manifest.len(), 1);
    }
}
