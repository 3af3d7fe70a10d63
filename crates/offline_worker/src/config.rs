//! Worker configuration loaded from TOML.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::manifest::AssetManifest;
use crate::tiers::TierNames;

/// Configuration shipped with the worker build.
pub const EMBEDDED_WORKER_CONFIG: &str = include_str!("../worker.toml");

const DEFAULT_SUBMISSION_PATH: &str = "/upload";
const DEFAULT_SHELL_PATH: &str = "/";
const DEFAULT_UPLOAD_TAG: &str = "background-upload";
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_IN_FLIGHT_LEASE_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Versioned worker configuration.
pub struct WorkerConfig {
    /// Cache version; bumping it invalidates every tier of the previous version.
    pub version: String,
    /// Prefix shared by every tier name.
    pub cache_prefix: String,
    /// Offline asset manifest.
    pub assets: AssetsConfig,
    /// Request routing.
    #[serde(default)]
    pub routes: RoutesConfig,
    /// Deferred-upload sync policy.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Push notification presentation.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Assets that must be available offline.
pub struct AssetsConfig {
    /// Same-origin absolute paths or cross-origin absolute URLs.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Path rules used by the interceptor.
pub struct RoutesConfig {
    /// Path of the image submission endpoint.
    pub submission_path: String,
    /// Path of the cached application shell served to offline navigations.
    pub shell_path: String,
    /// Path prefixes whose responses belong to the results tier.
    pub results_prefixes: Vec<String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            submission_path: DEFAULT_SUBMISSION_PATH.to_string(),
            shell_path: DEFAULT_SHELL_PATH.to_string(),
            results_prefixes: vec!["/results/".to_string(), "/uploads/".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Drain triggers and retry bounds.
pub struct SyncConfig {
    /// One-shot background-sync tag that drains the queue.
    pub upload_tag: String,
    /// Optional periodic-sync tag that drains the queue.
    pub periodic_tag: Option<String>,
    /// Resubmission attempts before an entry is marked failed.
    pub max_attempts: u32,
    /// Age after which an `in-flight` entry is considered abandoned.
    pub in_flight_lease_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upload_tag: DEFAULT_UPLOAD_TAG.to_string(),
            periodic_tag: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            in_flight_lease_ms: DEFAULT_IN_FLIGHT_LEASE_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Defaults applied to notifications built from push payloads.
pub struct NotificationsConfig {
    /// Icon URL.
    pub icon: Option<String>,
    /// Badge URL.
    pub badge: Option<String>,
    /// Coalescing tag.
    pub tag: Option<String>,
}

impl WorkerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and [`ConfigError::Invalid`] when
    /// validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses the configuration embedded at build time.
    ///
    /// # Errors
    ///
    /// Returns an error when the embedded document is invalid.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED_WORKER_CONFIG)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() || self.version.chars().any(char::is_whitespace) {
            return Err(invalid(format!("invalid version `{}`", self.version)));
        }
        if self.cache_prefix.is_empty()
            || !self
                .cache_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid(format!(
                "cache_prefix `{}` must be non-empty [A-Za-z0-9_-]",
                self.cache_prefix
            )));
        }

        require_path("routes.submission_path", &self.routes.submission_path)?;
        require_path("routes.shell_path", &self.routes.shell_path)?;
        if self.routes.results_prefixes.is_empty() {
            return Err(invalid("routes.results_prefixes must not be empty"));
        }
        for prefix in &self.routes.results_prefixes {
            require_path("routes.results_prefixes", prefix)?;
            if prefix == "/" {
                return Err(invalid("routes.results_prefixes must not contain `/`"));
            }
        }

        let mut seen = BTreeSet::new();
        for file in &self.assets.files {
            let is_url = file.starts_with("https://") || file.starts_with("http://");
            if !is_url && !file.starts_with('/') {
                return Err(invalid(format!(
                    "asset `{file}` must be an absolute path or http(s) URL"
                )));
            }
            if !seen.insert(file.as_str()) {
                return Err(invalid(format!("asset `{file}` is listed twice")));
            }
            if file == &self.routes.submission_path {
                return Err(invalid(format!(
                    "submission path `{file}` cannot be an offline asset"
                )));
            }
        }
        if !seen.contains(self.routes.shell_path.as_str()) {
            return Err(invalid(format!(
                "shell path `{}` must be listed in assets.files",
                self.routes.shell_path
            )));
        }

        if self.sync.upload_tag.trim().is_empty() {
            return Err(invalid("sync.upload_tag must not be empty"));
        }
        if self.sync.periodic_tag.as_deref() == Some(self.sync.upload_tag.as_str()) {
            return Err(invalid("sync.periodic_tag must differ from sync.upload_tag"));
        }
        if self.sync.max_attempts == 0 {
            return Err(invalid("sync.max_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Tier names for this version.
    pub fn tier_names(&self) -> TierNames {
        TierNames::new(&self.cache_prefix, &self.version)
    }

    /// Resolves the asset list against the worker `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an asset does not resolve.
    pub fn manifest(&self, scope: &Url) -> Result<AssetManifest, ConfigError> {
        AssetManifest::new(&self.version, &self.assets.files, scope)
    }
}

fn require_path(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(invalid(format!("{field} `{value}` must start with `/`")))
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
