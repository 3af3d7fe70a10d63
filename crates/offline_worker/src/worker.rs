//! Worker facade: one method per host lifecycle event.

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info, warn};
use offline_host::{
    CacheKey, ClientChannel, ClientMessage, ClientMessageKind, HostStrategy, NetworkClient,
    Notification, OutgoingRequest, PageMessage, WorkerServices,
};
use serde::Deserialize;
use url::Url;

use crate::config::WorkerConfig;
use crate::coordinator::{DrainReport, SyncCoordinator, SyncState, SyncTrigger};
use crate::error::WorkerError;
use crate::interceptor::{FetchDisposition, Interceptor};
use crate::lifecycle::{LifecycleEvent, WorkerLifecycle};
use crate::manifest::AssetManifest;
use crate::notifier::ClientNotifier;
use crate::queue::SubmissionQueue;
use crate::routing::RouteTable;
use crate::tiers::{InstallReport, TieredCache};

#[derive(Debug, Deserialize)]
struct PushPayload {
    title: String,
    #[serde(default)]
    body: String,
}

/// One worker version bound to its host services.
pub struct OfflineWorker {
    config: WorkerConfig,
    manifest: AssetManifest,
    shell_url: String,
    tiers: TieredCache,
    queue: SubmissionQueue,
    interceptor: Interceptor,
    coordinator: SyncCoordinator,
    notifier: ClientNotifier,
    network: Rc<dyn NetworkClient>,
    clients: Rc<dyn ClientChannel>,
    host_strategy: HostStrategy,
    lifecycle: Cell<WorkerLifecycle>,
    skip_waiting: Cell<bool>,
}

impl OfflineWorker {
    /// Builds a worker for pages under `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] for an invalid configuration and
    /// [`WorkerError::InvalidScope`] when `scope` is not an absolute http(s) URL.
    pub fn new(
        config: WorkerConfig,
        scope: &str,
        services: WorkerServices,
    ) -> Result<Self, WorkerError> {
        config.validate()?;
        let scope_url = Url::parse(scope)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| WorkerError::InvalidScope(scope.to_string()))?;
        let join = |path: &str| {
            scope_url
                .join(path)
                .map(String::from)
                .map_err(|_| WorkerError::InvalidScope(scope.to_string()))
        };
        let shell_url = join(&config.routes.shell_path)?;
        let submission_url = join(&config.routes.submission_path)?;
        let shell = CacheKey::get(&shell_url).map_err(WorkerError::InvalidScope)?;

        let manifest = config.manifest(&scope_url)?;
        let routes = Rc::new(RouteTable::new(&scope_url, manifest.clone(), &config.routes));
        let tiers = TieredCache::new(
            services.tiers.clone(),
            config.tier_names(),
            services.clock.clone(),
        );
        let queue = SubmissionQueue::new(
            services.queue.clone(),
            services.clock.clone(),
            config.sync.in_flight_lease_ms,
        );
        let notifier = ClientNotifier::new(services.clients.clone(), services.clock.clone());
        let interceptor = Interceptor::new(
            routes,
            tiers.clone(),
            queue.clone(),
            notifier.clone(),
            services.network.clone(),
            shell,
        );
        let coordinator = SyncCoordinator::new(
            queue.clone(),
            services.network.clone(),
            notifier.clone(),
            submission_url,
            config.sync.max_attempts,
        );

        info!(
            "offline worker v{} ({} assets) on {} host",
            config.version,
            manifest.len(),
            services.host_strategy.as_str()
        );
        Ok(Self {
            config,
            manifest,
            shell_url,
            tiers,
            queue,
            interceptor,
            coordinator,
            notifier,
            network: services.network,
            clients: services.clients,
            host_strategy: services.host_strategy,
            lifecycle: Cell::new(WorkerLifecycle::Parsed),
            skip_waiting: Cell::new(false),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> WorkerLifecycle {
        self.lifecycle.get()
    }

    /// Host strategy the services were composed for.
    pub fn host_strategy(&self) -> HostStrategy {
        self.host_strategy
    }

    /// Returns whether this version should take control without waiting for old pages to close.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.get()
    }

    /// Current sync coordinator state.
    pub fn sync_state(&self) -> SyncState {
        self.coordinator.state()
    }

    /// Submission queue of this worker.
    pub fn queue(&self) -> &SubmissionQueue {
        &self.queue
    }

    /// Restores the state of an instance the host restarted after this version was installed.
    ///
    /// The host fires `install` and `activate` once per version, not once per process, so a
    /// fresh instance whose static tier is already in storage resumes as activated. Other
    /// states are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Storage`] when the tier list cannot be read.
    pub async fn resume(&self) -> Result<WorkerLifecycle, WorkerError> {
        if self.lifecycle() != WorkerLifecycle::Parsed {
            return Ok(self.lifecycle());
        }
        let installed = self.tiers.is_installed().await.map_err(WorkerError::Storage)?;
        // install may have started while the tier list was read
        if installed && self.lifecycle() == WorkerLifecycle::Parsed {
            self.lifecycle
                .set(self.lifecycle().begin(LifecycleEvent::Resume)?);
            info!("resumed v{} from its installed static tier", self.manifest.version());
        }
        Ok(self.lifecycle())
    }

    /// Handles `install`: populates the static tier from the manifest.
    ///
    /// On failure the version becomes redundant and the previous version's tiers are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Install`] with the first failing asset, or
    /// [`WorkerError::Lifecycle`] when install already ran.
    pub async fn install(&self) -> Result<InstallReport, WorkerError> {
        self.lifecycle
            .set(self.lifecycle().begin(LifecycleEvent::Install)?);
        match self.tiers.install(&self.manifest, self.network.as_ref()).await {
            Ok(report) => {
                self.lifecycle.set(WorkerLifecycle::Installed);
                self.skip_waiting.set(true);
                info!("installed v{}: {} assets cached", self.manifest.version(), report.cached);
                Ok(report)
            }
            Err(err) => {
                self.lifecycle.set(WorkerLifecycle::Redundant);
                warn!("install of v{} aborted: {err}", self.manifest.version());
                Err(err.into())
            }
        }
    }

    /// Handles `activate`: deletes tiers of other versions and takes control.
    ///
    /// The version is activated even when stale-tier cleanup fails; the error is still returned
    /// so the host can log it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Lifecycle`] before install completes and [`WorkerError::Storage`]
    /// when the tier list cannot be read.
    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        self.resume().await?;
        self.lifecycle
            .set(self.lifecycle().begin(LifecycleEvent::Activate)?);
        let cleanup = self.tiers.activate().await;
        self.lifecycle.set(WorkerLifecycle::Activated);
        info!("activated v{}", self.manifest.version());
        cleanup.map_err(WorkerError::Storage)
    }

    /// Handles `fetch`.
    pub async fn fetch(&self, request: &OutgoingRequest) -> FetchDisposition {
        if let Err(err) = self.resume().await {
            warn!("resuming v{} failed: {err}", self.manifest.version());
        }
        if !self.lifecycle().serves_fetches() {
            return FetchDisposition::Passthrough;
        }
        self.interceptor.handle(request).await
    }

    /// Handles a one-shot background sync; tags other than the upload tag are ignored.
    ///
    /// # Errors
    ///
    /// Returns queue storage failures.
    pub async fn sync(&self, tag: &str) -> Result<Option<DrainReport>, WorkerError> {
        if tag != self.config.sync.upload_tag {
            debug!("ignoring sync tag {tag}");
            return Ok(None);
        }
        self.drain(SyncTrigger::BackgroundSync).await
    }

    /// Handles a periodic sync; tags other than the periodic tag are ignored.
    ///
    /// # Errors
    ///
    /// Returns queue storage failures.
    pub async fn periodic_sync(&self, tag: &str) -> Result<Option<DrainReport>, WorkerError> {
        if self.config.sync.periodic_tag.as_deref() != Some(tag) {
            debug!("ignoring periodic sync tag {tag}");
            return Ok(None);
        }
        self.drain(SyncTrigger::PeriodicSync).await
    }

    /// Handles the host's connectivity-restored signal.
    ///
    /// # Errors
    ///
    /// Returns queue storage failures.
    pub async fn online(&self) -> Result<Option<DrainReport>, WorkerError> {
        self.drain(SyncTrigger::Online).await
    }

    /// Handles a page message and returns the reply for the sender, if any.
    ///
    /// # Errors
    ///
    /// Returns queue storage failures.
    pub async fn message(&self, message: PageMessage) -> Result<Option<ClientMessage>, WorkerError> {
        match message {
            PageMessage::SkipWaiting => {
                self.skip_waiting.set(true);
                Ok(None)
            }
            PageMessage::SyncUploads => {
                self.drain(SyncTrigger::Foreground).await?;
                Ok(None)
            }
            PageMessage::ListQueue => {
                let entries = self
                    .queue
                    .list()
                    .await?
                    .iter()
                    .map(|entry| entry.summary())
                    .collect();
                Ok(Some(
                    self.notifier
                        .message(ClientMessageKind::QueueSnapshot { entries }),
                ))
            }
            PageMessage::ShareTarget { data } => {
                info!("share target received: {data}");
                Ok(None)
            }
        }
    }

    /// Handles `push`: shows a notification built from a `{title, body}` JSON payload.
    ///
    /// Payload-less and malformed pushes are ignored.
    pub async fn push(&self, data: Option<&str>) -> Option<Notification> {
        let raw = data?;
        let payload = match serde_json::from_str::<PushPayload>(raw) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("ignoring malformed push payload: {err}");
                return None;
            }
        };
        let notification = Notification {
            title: payload.title,
            body: payload.body,
            icon: self.config.notifications.icon.clone(),
            badge: self.config.notifications.badge.clone(),
            tag: self.config.notifications.tag.clone(),
        };
        if let Err(err) = self.clients.show_notification(&notification).await {
            warn!("showing notification failed: {err}");
        }
        Some(notification)
    }

    /// Handles `notificationclick`: opens the application shell and returns its URL.
    pub async fn notification_click(&self) -> &str {
        if let Err(err) = self.clients.open_window(&self.shell_url).await {
            warn!("opening {} failed: {err}", self.shell_url);
        }
        &self.shell_url
    }

    async fn drain(&self, trigger: SyncTrigger) -> Result<Option<DrainReport>, WorkerError> {
        if !self.lifecycle().handles_events() {
            return Ok(None);
        }
        Ok(Some(self.coordinator.drain(trigger).await?))
    }
}
