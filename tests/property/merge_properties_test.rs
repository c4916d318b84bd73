//! Property-based tests for the Snapshot Merger.
//!
//! These tests verify that merging is idempotent without heuristic matching, that at
//! most one record is active after any merge, and that reconciliation never duplicates
//! a restarted tab.

use edgetabs::managers::snapshot_merger::{MergeMode, SnapshotMerger};
use edgetabs::managers::tab_store::{TabStore, TabStoreTrait};
use edgetabs::types::tab::{HostTab, TabStatus};
use proptest::prelude::*;

/// Strategy for a single live tab with an ID drawn from a small range, so that
/// snapshots overlap with the store.
fn arb_host_tab() -> impl Strategy<Value = HostTab> {
    (
        1..12i64,
        prop::sample::select(vec!["https://a", "https://b", "https://c", "edge://newtab"]),
        any::<bool>(),
        any::<bool>(),
        prop::option::of(prop::sample::select(vec![
            TabStatus::Loading,
            TabStatus::Complete,
            TabStatus::Unloaded,
        ])),
    )
        .prop_map(|(id, url, active, pinned, status)| {
            let mut tab = HostTab::new(id, url);
            tab.active = active;
            tab.pinned = pinned;
            tab.status = status;
            tab
        })
}

/// A live snapshot: host IDs are unique within one query result.
fn arb_snapshot() -> impl Strategy<Value = Vec<HostTab>> {
    prop::collection::vec(arb_host_tab(), 0..10).prop_map(|tabs| {
        let mut seen = std::collections::HashSet::new();
        tabs.into_iter().filter(|t| seen.insert(t.id)).collect()
    })
}

fn arb_mode() -> impl Strategy<Value = MergeMode> {
    prop_oneof![Just(MergeMode::Incremental), Just(MergeMode::Reconcile)]
}

// **Property: merge idempotence**
//
// *For any* store and live snapshot, merging the snapshot twice without heuristic
// matching SHALL leave the same store as merging it once.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn merge_twice_equals_merge_once(history in arb_snapshot(), live in arb_snapshot()) {
        let mut store = TabStore::new();
        SnapshotMerger::merge(&mut store, &history, MergeMode::Incremental);

        let mut once = store.clone();
        SnapshotMerger::merge(&mut once, &live, MergeMode::Incremental);
        let mut twice = once.clone();
        SnapshotMerger::merge(&mut twice, &live, MergeMode::Incremental);

        prop_assert_eq!(once, twice);
    }
}

// **Property: single active record**
//
// *For any* sequence of merges, every merge whose snapshot carries an active tab SHALL
// leave exactly one active record, and that record SHALL be the first active live tab.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn single_active_after_merge(
        rounds in prop::collection::vec((arb_snapshot(), arb_mode()), 1..6)
    ) {
        let mut store = TabStore::new();
        for (live, mode) in &rounds {
            let report = SnapshotMerger::merge(&mut store, live, *mode);
            let active = store.get().iter().filter(|r| r.is_active).count();

            match live.iter().find(|t| t.active).and_then(|t| t.id) {
                Some(expected) => {
                    prop_assert_eq!(active, 1);
                    prop_assert_eq!(store.active_id(), Some(expected));
                    prop_assert_eq!(report.active, Some(expected));
                }
                None => prop_assert!(report.active.is_none()),
            }
        }
    }
}

// **Property: ID uniqueness**
//
// *For any* sequence of merges in either mode, no two records SHALL share an ID and
// every live tab SHALL be present afterwards.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn ids_stay_unique_and_live_tabs_present(
        rounds in prop::collection::vec((arb_snapshot(), arb_mode()), 1..6)
    ) {
        let mut store = TabStore::new();
        for (live, mode) in &rounds {
            SnapshotMerger::merge(&mut store, live, *mode);

            let ids = store.ids();
            let unique: std::collections::HashSet<_> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len());
            for tab in live {
                prop_assert!(store.position(tab.id.unwrap()).is_some());
            }
        }
    }
}

// **Property: restart reconciliation**
//
// *For any* store whose active record shows url U, a reconciling merge of a single
// active live tab with a fresh ID and url U SHALL relink that record instead of
// adding one.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn restarted_active_tab_is_relinked(live in arb_snapshot(), fresh in 100..200i64) {
        let mut store = TabStore::new();
        SnapshotMerger::merge(&mut store, &live, MergeMode::Incremental);
        let Some(url) = store.get().iter().find(|r| r.is_active).and_then(|r| r.url.clone()) else {
            return Ok(());
        };
        let before = store.len();

        let mut restarted = HostTab::new(fresh, &url);
        restarted.active = true;
        let report = SnapshotMerger::merge(&mut store, &[restarted], MergeMode::Reconcile);

        prop_assert_eq!(report.reconciled.len(), 1);
        prop_assert_eq!(store.len(), before);
        prop_assert_eq!(store.active_id(), Some(fresh));
    }
}
