//! Offerwatch core: pure domain model, diff logic and the run-phase machine.
mod diff;
mod offer;
mod phase;
mod snapshot;
mod template;

pub use diff::{diff, DiffResult};
pub use offer::{Offer, OfferId};
pub use phase::{PhaseError, PhaseTracker, RunPhase};
pub use snapshot::StateSnapshot;
pub use template::{fill_date_template, shift_months, TemplateError};
