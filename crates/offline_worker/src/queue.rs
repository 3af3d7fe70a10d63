//! Offline submission queue service over a durable [`QueueStore`].
//!
//! Entries move `pending → in-flight → (removed | pending | failed)`. At most one entry may be
//! `in-flight`; [`SubmissionQueue::mark_in_flight`] enforces that against durable state so two
//! worker instances cannot resubmit concurrently.
//!
//! Sequence allocation and the in-flight check read the store before writing it, so both run
//! under one async lock shared by every clone of the queue.

use std::rc::Rc;

use futures::lock::Mutex;
use log::{info, warn};
use offline_host::{Clock, QueueEntry, QueueEntryStatus, QueueStore, SubmissionPayload};
use uuid::Uuid;

use crate::error::QueueError;

/// Entry counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    /// Entries waiting for a drain.
    pub pending: usize,
    /// Entries being resubmitted.
    pub in_flight: usize,
    /// Entries that will not be retried automatically.
    pub failed: usize,
}

/// Outcome of abandoned in-flight recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recovery {
    /// Entries whose lease expired and were reset to `pending`.
    pub reset: Vec<String>,
    /// Entry still legitimately in flight, if any.
    pub active: Option<String>,
}

/// FIFO queue of deferred submissions.
#[derive(Clone)]
pub struct SubmissionQueue {
    store: Rc<dyn QueueStore>,
    clock: Rc<dyn Clock>,
    in_flight_lease_ms: u64,
    writes: Rc<Mutex<()>>,
}

impl SubmissionQueue {
    /// Creates a queue over `store`.
    pub fn new(store: Rc<dyn QueueStore>, clock: Rc<dyn Clock>, in_flight_lease_ms: u64) -> Self {
        Self {
            store,
            clock,
            in_flight_lease_ms,
            writes: Rc::new(Mutex::new(())),
        }
    }

    /// Appends a `pending` entry and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Storage`] when the store fails.
    pub async fn enqueue(&self, payload: SubmissionPayload) -> Result<QueueEntry, QueueError> {
        let _guard = self.writes.lock().await;
        let entries = self.list().await?;
        let sequence = entries
            .iter()
            .map(|entry| entry.sequence)
            .max()
            .map_or(1, |last| last + 1);
        let entry = QueueEntry::pending(
            Uuid::new_v4().to_string(),
            sequence,
            self.clock.now_unix_ms(),
            payload,
        );
        self.store
            .save_entry(&entry)
            .await
            .map_err(QueueError::Storage)?;
        info!(
            "queued submission {} ({}, {} bytes)",
            entry.id,
            entry.payload.filename,
            entry.payload.bytes.len()
        );
        Ok(entry)
    }

    /// Every entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Storage`] when the store fails.
    pub async fn list(&self) -> Result<Vec<QueueEntry>, QueueError> {
        let mut entries = self.store.list_entries().await.map_err(QueueError::Storage)?;
        entries.sort_by_key(|entry| (entry.sequence, entry.created_at_unix_ms));
        Ok(entries)
    }

    /// Counts entries by status.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Storage`] when the store fails.
    pub async fn summary(&self) -> Result<QueueSummary, QueueError> {
        let mut summary = QueueSummary::default();
        for entry in self.list().await? {
            match entry.status {
                QueueEntryStatus::Pending => summary.pending += 1,
                QueueEntryStatus::InFlight => summary.in_flight += 1,
                QueueEntryStatus::Failed => summary.failed += 1,
                QueueEntryStatus::Done => {}
            }
        }
        Ok(summary)
    }

    /// Oldest `pending` entry.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Storage`] when the store fails.
    pub async fn peek_oldest_pending(&self) -> Result<Option<QueueEntry>, QueueError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|entry| entry.status == QueueEntryStatus::Pending))
    }

    /// Moves a `pending` entry to `in-flight` and counts the attempt.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::AlreadyInFlight`] when another entry is in flight,
    /// [`QueueError::NotFound`] or [`QueueError::InvalidTransition`] for a bad id or status.
    pub async fn mark_in_flight(&self, id: &str) -> Result<QueueEntry, QueueError> {
        let _guard = self.writes.lock().await;
        let entries = self.list().await?;
        if let Some(other) = entries
            .iter()
            .find(|entry| entry.status == QueueEntryStatus::InFlight)
        {
            return Err(QueueError::AlreadyInFlight(other.id.clone()));
        }
        let mut entry = entries
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        require_status(&entry, QueueEntryStatus::Pending, QueueEntryStatus::InFlight)?;
        entry.attempts = entry.attempts.saturating_add(1);
        self.transition(entry, QueueEntryStatus::InFlight, None).await
    }

    /// Returns an `in-flight` entry to `pending` after a connectivity failure.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] or [`QueueError::InvalidTransition`].
    pub async fn mark_pending(&self, id: &str, reason: &str) -> Result<QueueEntry, QueueError> {
        let entry = self.load(id).await?;
        require_status(&entry, QueueEntryStatus::InFlight, QueueEntryStatus::Pending)?;
        self.transition(entry, QueueEntryStatus::Pending, Some(reason.to_string()))
            .await
    }

    /// Records server acknowledgment of an `in-flight` entry and removes it.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`], [`QueueError::InvalidTransition`], or a storage error.
    pub async fn mark_done(&self, id: &str) -> Result<(), QueueError> {
        let entry = self.load(id).await?;
        require_status(&entry, QueueEntryStatus::InFlight, QueueEntryStatus::Done)?;
        self.store
            .delete_entry(id)
            .await
            .map_err(QueueError::Storage)?;
        info!("submission {id} delivered after {} attempt(s)", entry.attempts);
        Ok(())
    }

    /// Marks an entry `failed`; it stays listed but is never resubmitted automatically.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] or a storage error.
    pub async fn mark_failed(&self, id: &str, reason: &str) -> Result<QueueEntry, QueueError> {
        let entry = self.load(id).await?;
        warn!("submission {id} failed permanently: {reason}");
        self.transition(entry, QueueEntryStatus::Failed, Some(reason.to_string()))
            .await
    }

    /// Resets `in-flight` entries older than the lease to `pending`.
    ///
    /// A worker recycled mid-drain leaves its entry `in-flight` in durable storage; without this
    /// the queue would stall forever.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn recover_stale(&self) -> Result<Recovery, QueueError> {
        let now = self.clock.now_unix_ms();
        let mut recovery = Recovery::default();
        for entry in self.list().await? {
            if entry.status != QueueEntryStatus::InFlight {
                continue;
            }
            let age = now.saturating_sub(entry.status_changed_at_unix_ms);
            if age < self.in_flight_lease_ms {
                recovery.active = Some(entry.id);
                continue;
            }
            warn!("resetting abandoned in-flight submission {} ({age} ms)", entry.id);
            let id = entry.id.clone();
            self.transition(
                entry,
                QueueEntryStatus::Pending,
                Some("in-flight lease expired".to_string()),
            )
            .await?;
            recovery.reset.push(id);
        }
        Ok(recovery)
    }

    async fn load(&self, id: &str) -> Result<QueueEntry, QueueError> {
        self.store
            .load_entry(id)
            .await
            .map_err(QueueError::Storage)?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))
    }

    async fn transition(
        &self,
        mut entry: QueueEntry,
        status: QueueEntryStatus,
        reason: Option<String>,
    ) -> Result<QueueEntry, QueueError> {
        entry.status = status;
        entry.status_changed_at_unix_ms = self.clock.now_unix_ms();
        if reason.is_some() {
            entry.last_error = reason;
        }
        self.store
            .save_entry(&entry)
            .await
            .map_err(QueueError::Storage)?;
        Ok(entry)
    }
}

fn require_status(
    entry: &QueueEntry,
    expected: QueueEntryStatus,
    to: QueueEntryStatus,
) -> Result<(), QueueError> {
    if entry.status == expected {
        Ok(())
    } else {
        Err(QueueError::InvalidTransition {
            id: entry.id.clone(),
            from: entry.status,
            to,
        })
    }
}
