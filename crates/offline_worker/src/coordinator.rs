//! Sync coordinator: drains the submission queue when connectivity returns.
//!
//! One drain runs at a time per worker (`idle → draining → idle`). A drain resubmits entries
//! oldest first, one at a time, and stops at the first connectivity failure so the remaining
//! entries keep their order for the next trigger.

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, error, info, warn};
use offline_host::{ClientMessageKind, NetworkClient, OutgoingRequest};

use crate::error::QueueError;
use crate::notifier::ClientNotifier;
use crate::queue::SubmissionQueue;
use crate::submission::{classify_submission, SubmissionOutcome};

const SETTLE_ATTEMPTS: u32 = 3;

/// Event that started a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// The host reported connectivity.
    Online,
    /// The one-shot background sync tag fired.
    BackgroundSync,
    /// The periodic sync tag fired.
    PeriodicSync,
    /// A page asked for a drain.
    Foreground,
}

impl SyncTrigger {
    /// Stable token for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::BackgroundSync => "background-sync",
            Self::PeriodicSync => "periodic-sync",
            Self::Foreground => "foreground",
        }
    }
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No drain running.
    Idle,
    /// A drain is resubmitting entries.
    Draining,
}

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// No pending entries remain.
    Completed,
    /// A connectivity failure stopped the cycle.
    Interrupted,
    /// Another drain was running or an entry is still in flight.
    Skipped,
}

impl DrainOutcome {
    /// Stable token for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Skipped => "skipped",
        }
    }
}

/// Summary of one drain cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// What started the drain.
    pub trigger: SyncTrigger,
    /// How it ended.
    pub outcome: DrainOutcome,
    /// Entries acknowledged by the server.
    pub submitted: usize,
    /// Entries marked `failed` during this cycle.
    pub failed: usize,
    /// Entries still `pending` afterwards.
    pub remaining: usize,
}

impl DrainReport {
    fn new(trigger: SyncTrigger, outcome: DrainOutcome) -> Self {
        Self {
            trigger,
            outcome,
            submitted: 0,
            failed: 0,
            remaining: 0,
        }
    }
}

struct DrainGuard<'a>(&'a Cell<SyncState>);

impl<'a> DrainGuard<'a> {
    fn enter(state: &'a Cell<SyncState>) -> Option<Self> {
        if state.get() == SyncState::Draining {
            return None;
        }
        state.set(SyncState::Draining);
        Some(Self(state))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(SyncState::Idle);
    }
}

/// Drives queue drains.
pub struct SyncCoordinator {
    queue: SubmissionQueue,
    network: Rc<dyn NetworkClient>,
    notifier: ClientNotifier,
    submission_url: String,
    max_attempts: u32,
    state: Cell<SyncState>,
}

impl SyncCoordinator {
    /// Creates an idle coordinator resubmitting to `submission_url`.
    pub fn new(
        queue: SubmissionQueue,
        network: Rc<dyn NetworkClient>,
        notifier: ClientNotifier,
        submission_url: String,
        max_attempts: u32,
    ) -> Self {
        Self {
            queue,
            network,
            notifier,
            submission_url,
            max_attempts,
            state: Cell::new(SyncState::Idle),
        }
    }

    /// Current state.
    pub fn state(&self) -> SyncState {
        self.state.get()
    }

    /// Runs one drain pass.
    ///
    /// Emits `sync-uploads` when there is work, `upload-success` per acknowledged entry.
    ///
    /// # Errors
    ///
    /// Returns queue storage failures; the drain stops and the coordinator returns to idle.
    pub async fn drain(&self, trigger: SyncTrigger) -> Result<DrainReport, QueueError> {
        let Some(_guard) = DrainGuard::enter(&self.state) else {
            debug!("drain ({}) skipped: already draining", trigger.as_str());
            return Ok(DrainReport::new(trigger, DrainOutcome::Skipped));
        };

        let recovery = self.queue.recover_stale().await?;
        if let Some(active) = recovery.active {
            debug!("drain ({}) skipped: {active} still in flight", trigger.as_str());
            let mut report = DrainReport::new(trigger, DrainOutcome::Skipped);
            report.remaining = self.queue.summary().await?.pending;
            return Ok(report);
        }

        let mut report = DrainReport::new(trigger, DrainOutcome::Completed);
        if self.queue.summary().await?.pending == 0 {
            return Ok(report);
        }
        info!("drain ({}) started", trigger.as_str());
        self.notifier.notify(ClientMessageKind::SyncUploads).await;

        while let Some(next) = self.queue.peek_oldest_pending().await? {
            let entry = self.queue.mark_in_flight(&next.id).await?;
            let request = OutgoingRequest::submission(&self.submission_url, entry.payload.clone());
            match classify_submission(self.network.fetch(&request).await) {
                SubmissionOutcome::Accepted(_) => {
                    let settled = self.settle_delivered(&entry.id).await;
                    report.submitted += 1;
                    self.notifier.notify(ClientMessageKind::UploadSuccess).await;
                    if let Err(err) = settled {
                        error!(
                            "submission {} was delivered but is still queued and will be \
                             resubmitted once its lease expires: {err}",
                            entry.id
                        );
                        report.outcome = DrainOutcome::Interrupted;
                        break;
                    }
                }
                SubmissionOutcome::Rejected(response) => {
                    let reason = format!("server responded {}", response.status);
                    self.queue.mark_failed(&entry.id, &reason).await?;
                    report.failed += 1;
                }
                SubmissionOutcome::Deferred(reason) => {
                    if entry.attempts >= self.max_attempts {
                        let reason = format!("gave up after {} attempts: {reason}", entry.attempts);
                        self.queue.mark_failed(&entry.id, &reason).await?;
                        report.failed += 1;
                    } else {
                        self.queue.mark_pending(&entry.id, &reason).await?;
                    }
                    warn!("drain ({}) interrupted: {reason}", trigger.as_str());
                    report.outcome = DrainOutcome::Interrupted;
                    break;
                }
            }
        }

        report.remaining = self.queue.summary().await?.pending;
        info!(
            "drain ({}) finished: {} submitted, {} failed, {} remaining",
            trigger.as_str(),
            report.submitted,
            report.failed,
            report.remaining
        );
        Ok(report)
    }

    /// Removes an acknowledged entry, retrying storage failures.
    async fn settle_delivered(&self, id: &str) -> Result<(), QueueError> {
        let mut attempt = 1;
        loop {
            match self.queue.mark_done(id).await {
                Err(QueueError::Storage(reason)) if attempt < SETTLE_ATTEMPTS => {
                    warn!("removing delivered submission {id} failed (attempt {attempt}): {reason}");
                    attempt += 1;
                }
                settled => return settled,
            }
        }
    }
}
