use thiserror::Error;

/// Phases of one check cycle, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    SessionOpen,
    PageReady,
    Extracted,
    Diffed,
    Notified,
    Committed,
    Aborted,
}

impl RunPhase {
    /// Whether a direct transition `self -> next` is legal.
    ///
    /// `Notified` is optional: an empty delta goes `Diffed -> Committed`
    /// directly. `Aborted` is reachable from any non-terminal phase.
    pub fn can_transition(self, next: RunPhase) -> bool {
        use RunPhase::*;
        match (self, next) {
            (Idle, SessionOpen)
            | (SessionOpen, PageReady)
            | (PageReady, Extracted)
            | (Extracted, Diffed)
            | (Diffed, Notified)
            | (Diffed, Committed)
            | (Notified, Committed) => true,
            (from, Aborted) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Committed | RunPhase::Aborted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal phase transition {from:?} -> {to:?}")]
pub struct PhaseError {
    pub from: RunPhase,
    pub to: RunPhase,
}

/// Tracks the current phase of a run and rejects illegal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTracker {
    current: RunPhase,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: RunPhase::Idle,
        }
    }

    pub fn current(&self) -> RunPhase {
        self.current
    }

    pub fn advance(&mut self, to: RunPhase) -> Result<(), PhaseError> {
        if self.current.can_transition(to) {
            self.current = to;
            Ok(())
        } else {
            Err(PhaseError {
                from: self.current,
                to,
            })
        }
    }

    /// Move to `Aborted`. Legal from any non-terminal phase.
    pub fn abort(&mut self) -> Result<(), PhaseError> {
        self.advance(RunPhase::Aborted)
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
