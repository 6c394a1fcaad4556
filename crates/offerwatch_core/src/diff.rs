use std::collections::BTreeSet;

use crate::{Offer, StateSnapshot};

/// Result of comparing one extraction against the persisted baseline.
/// Ephemeral; produced once per run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffResult {
    /// Offers present now that were absent from the prior snapshot.
    pub new_offers: Vec<Offer>,
    /// Ids present both now and in the prior snapshot.
    pub unchanged_ids: BTreeSet<String>,
    /// Ids from the prior snapshot that are gone now. Informational.
    pub removed_ids: BTreeSet<String>,
    /// True when there was no prior snapshot. The coordinator suppresses
    /// notification on a first run; the diff itself still reports every
    /// current offer as new.
    pub first_run: bool,
}

/// Pure set comparison keyed on offer id.
///
/// Identity is key-based only: an id that reappears with different
/// display attributes (price change, retitled) is UNCHANGED. `current`
/// is expected to be already deduplicated by the extractor.
pub fn diff(current: &[Offer], prior: Option<&StateSnapshot>) -> DiffResult {
    let Some(prior) = prior else {
        return DiffResult {
            new_offers: current.to_vec(),
            first_run: true,
            ..DiffResult::default()
        };
    };

    let current_ids: BTreeSet<&str> = current.iter().map(|o| o.id.as_str()).collect();

    let new_offers = current
        .iter()
        .filter(|o| !prior.contains(o.id.as_str()))
        .cloned()
        .collect();
    let unchanged_ids = current
        .iter()
        .filter(|o| prior.contains(o.id.as_str()))
        .map(|o| o.id.as_str().to_owned())
        .collect();
    let removed_ids = prior
        .offer_ids
        .iter()
        .filter(|id| !current_ids.contains(id.as_str()))
        .cloned()
        .collect();

    DiffResult {
        new_offers,
        unchanged_ids,
        removed_ids,
        first_run: false,
    }
}
