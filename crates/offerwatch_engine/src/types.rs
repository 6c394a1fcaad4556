use offerwatch_core::PhaseError;
use serde::Serialize;

use crate::extract::ExtractError;
use crate::notify::NotifyError;
use crate::persist::PersistError;

/// Terminal status of one check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Committed,
    Aborted,
}

/// Failure taxonomy for a check cycle. Every failure is caught at the
/// coordinator boundary and surfaces here; nothing panics across it.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The browser process/session could not be started. Fatal for the run.
    #[error("browser session could not be launched: {0}")]
    SessionLaunch(String),
    /// The ready condition was not met in time. Recoverable: retried
    /// within the configured bound before becoming fatal.
    #[error("navigation did not reach ready state: {0}")]
    NavigationTimeout(String),
    /// The WebDriver endpoint answered with something unusable.
    #[error("webdriver protocol error: {0}")]
    Protocol(String),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),
    /// Zero offers extracted while the prior snapshot was non-empty and
    /// empty results are not trusted. The prior baseline is kept.
    #[error("extraction yielded 0 offers where prior snapshot had {prior_count}")]
    SuspiciousEmptyExtraction { prior_count: usize },
    /// Committing the new snapshot failed. The previous snapshot stays
    /// authoritative.
    #[error("state persistence failed: {0}")]
    Persistence(#[from] PersistError),
    /// The notification boundary failed. Non-fatal: the run still
    /// commits, the error rides along in the outcome.
    #[error("notification failed: {0}")]
    Notification(#[from] NotifyError),
    #[error("run cancelled")]
    Cancelled,
    #[error("another check is already in flight")]
    AlreadyRunning,
    #[error(transparent)]
    Phase(#[from] PhaseError),
}

impl RunError {
    /// Stable machine-readable label for the outcome surface.
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::SessionLaunch(_) => "session_launch",
            RunError::NavigationTimeout(_) => "navigation_timeout",
            RunError::Protocol(_) => "protocol",
            RunError::Extraction(_) => "extraction",
            RunError::SuspiciousEmptyExtraction { .. } => "suspicious_empty_extraction",
            RunError::Persistence(_) => "persistence",
            RunError::Notification(_) => "notification",
            RunError::Cancelled => "cancelled",
            RunError::AlreadyRunning => "already_running",
            RunError::Phase(_) => "phase",
        }
    }
}

/// The sole observable signal of a run, returned to whatever invoked it.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub new_offer_count: usize,
    pub error: Option<RunError>,
}

impl RunOutcome {
    pub fn committed(new_offer_count: usize, error: Option<RunError>) -> Self {
        Self {
            status: RunStatus::Committed,
            new_offer_count,
            error,
        }
    }

    pub fn aborted(error: RunError) -> Self {
        Self {
            status: RunStatus::Aborted,
            new_offer_count: 0,
            error: Some(error),
        }
    }

    /// JSON rendering for schedulers that parse stdout.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status,
            "new_offer_count": self.new_offer_count,
            "error": self.error.as_ref().map(|err| {
                serde_json::json!({ "kind": err.kind(), "message": err.to_string() })
            }),
        })
    }
}
