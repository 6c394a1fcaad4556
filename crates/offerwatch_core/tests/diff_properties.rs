use std::collections::BTreeSet;

use chrono::Utc;
use offerwatch_core::{diff, Offer, OfferId, StateSnapshot};

fn offer(id: &str, title: &str) -> Offer {
    Offer {
        id: OfferId::native(id),
        title: title.to_owned(),
        link: format!("https://example.test/offers/{id}"),
        price: None,
        location: None,
        posted_at: None,
    }
}

fn snapshot(ids: &[&str]) -> StateSnapshot {
    StateSnapshot {
        offer_ids: ids.iter().map(|s| (*s).to_owned()).collect(),
        last_run_at: Utc::now(),
    }
}

#[test]
fn scenario_a_new_and_removed() {
    // prior {1,2}, current {2,3} => new {3}, removed {1}.
    let prior = snapshot(&["1", "2"]);
    let current = vec![offer("2", "Room 2"), offer("3", "Room 3")];

    let result = diff(&current, Some(&prior));

    let new_ids: Vec<&str> = result.new_offers.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(new_ids, vec!["3"]);
    assert_eq!(result.removed_ids, ["1".to_owned()].into());
    assert_eq!(result.unchanged_ids, ["2".to_owned()].into());
    assert!(!result.first_run);
}

#[test]
fn empty_prior_marks_everything_new_and_first_run() {
    let current = vec![offer("a", "A"), offer("b", "B"), offer("c", "C")];

    let result = diff(&current, None);

    assert!(result.first_run);
    assert_eq!(result.new_offers, current);
    assert!(result.removed_ids.is_empty());
    assert!(result.unchanged_ids.is_empty());
}

#[test]
fn new_and_removed_are_disjoint_and_partition_current() {
    let prior = snapshot(&["1", "2", "5"]);
    let current = vec![
        offer("2", "Two"),
        offer("3", "Three"),
        offer("5", "Five"),
        offer("7", "Seven"),
    ];

    let result = diff(&current, Some(&prior));

    let new_ids: BTreeSet<String> = result
        .new_offers
        .iter()
        .map(|o| o.id.as_str().to_owned())
        .collect();
    let current_ids: BTreeSet<String> =
        current.iter().map(|o| o.id.as_str().to_owned()).collect();

    assert!(new_ids.is_disjoint(&result.removed_ids));
    let union: BTreeSet<String> = new_ids.union(&result.unchanged_ids).cloned().collect();
    assert_eq!(union, current_ids);
    assert!(new_ids.is_disjoint(&result.unchanged_ids));
}

#[test]
fn diff_is_idempotent() {
    let prior = snapshot(&["1", "2"]);
    let current = vec![offer("2", "Two"), offer("3", "Three")];

    let first = diff(&current, Some(&prior));
    let second = diff(&current, Some(&prior));
    assert_eq!(first, second);
}

#[test]
fn changed_attributes_on_same_id_are_unchanged() {
    // Identity is the key alone: a price edit on a known id is not new.
    let prior = snapshot(&["k1"]);
    let mut current = vec![offer("k1", "Same room")];
    current[0].price = Some("999".to_owned());

    let result = diff(&current, Some(&prior));

    assert!(result.new_offers.is_empty());
    assert_eq!(result.unchanged_ids, ["k1".to_owned()].into());
}

#[test]
fn removed_then_reappeared_counts_as_new() {
    // The snapshot is the latest full id set, not a running union.
    let gone = diff(&[], Some(&snapshot(&["x"])));
    assert_eq!(gone.removed_ids, ["x".to_owned()].into());

    let after_removal = snapshot(&[]);
    let back = diff(&[offer("x", "X")], Some(&after_removal));
    assert_eq!(back.new_offers.len(), 1);
}

#[test]
fn snapshot_from_offers_collects_ids() {
    let offers = vec![offer("a", "A"), offer("b", "B")];
    let snap = StateSnapshot::from_offers(&offers, Utc::now());
    assert_eq!(snap.offer_ids, ["a".to_owned(), "b".to_owned()].into());
    assert!(snap.contains("a"));
    assert!(!snap.contains("z"));
}
