//! Worker version lifecycle.

use crate::error::WorkerError;

/// Lifecycle state of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerLifecycle {
    /// Script evaluated; install has not run.
    #[default]
    Parsed,
    /// Populating the static tier.
    Installing,
    /// Static tier ready; waiting to take control.
    Installed,
    /// Removing stale tiers.
    Activating,
    /// Controlling pages.
    Activated,
    /// Install failed; the previous version stays in control.
    Redundant,
}

impl WorkerLifecycle {
    /// Stable token for logs and errors.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        }
    }

    /// Returns whether fetches may be served from this version's tiers.
    pub const fn serves_fetches(self) -> bool {
        matches!(self, Self::Installed | Self::Activating | Self::Activated)
    }

    /// Returns whether sync triggers and page messages are handled.
    pub const fn handles_events(self) -> bool {
        !matches!(self, Self::Redundant)
    }

    /// Validates the transition for `event` and returns the in-progress state.
    ///
    /// A resumed version may still receive `activate` when the host restarted it while it was
    /// waiting, so activation is accepted from `Activated` as well.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Lifecycle`] when `event` is not valid in this state.
    pub fn begin(self, event: LifecycleEvent) -> Result<Self, WorkerError> {
        match (event, self) {
            (LifecycleEvent::Install, Self::Parsed) => Ok(Self::Installing),
            (LifecycleEvent::Activate, Self::Installed | Self::Activated) => Ok(Self::Activating),
            (LifecycleEvent::Resume, Self::Parsed) => Ok(Self::Activated),
            _ => Err(WorkerError::Lifecycle {
                event: event.as_str(),
                state: self.as_str(),
            }),
        }
    }
}

/// Lifecycle event delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `install`
    Install,
    /// `activate`
    Activate,
    /// A restarted instance found its version already installed.
    Resume,
}

impl LifecycleEvent {
    /// Event name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Resume => "resume",
        }
    }
}
