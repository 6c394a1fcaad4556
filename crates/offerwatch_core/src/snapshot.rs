use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Offer;

/// The persisted baseline: the full id set of the last successful run.
///
/// Always the latest full snapshot, never a running union — an offer that
/// drops out and later reappears counts as new again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub offer_ids: BTreeSet<String>,
    pub last_run_at: DateTime<Utc>,
}

impl StateSnapshot {
    /// Build the snapshot for a just-completed extraction.
    pub fn from_offers(offers: &[Offer], last_run_at: DateTime<Utc>) -> Self {
        Self {
            offer_ids: offers.iter().map(|o| o.id.as_str().to_owned()).collect(),
            last_run_at,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.offer_ids.contains(id)
    }
}
