//! Snapshot Merger: folds live host tabs into the Tab Record Store.
//!
//! A live tab is matched to a stored record by ID. When merging a full query result
//! (initialization, periodic resync) a second, heuristic pass may re-link a stale record
//! to a new host ID: after a browser restart the host hands out fresh IDs, but the tab
//! that was active keeps its url.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::managers::tab_store::{TabStore, TabStoreTrait};
use crate::types::tab::{HostTab, TabId, TabRecord};

/// Whether heuristic identity matching is allowed during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// ID matching only. Used for lifecycle events and debounced resyncs.
    Incremental,
    /// ID matching, then url + previously-active matching. Used for full query results.
    Reconcile,
}

/// What a merge did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub inserted: Vec<TabId>,
    pub updated: Vec<TabId>,
    /// `(old_id, new_id)` for every heuristic identity rewrite.
    pub reconciled: Vec<(Option<TabId>, TabId)>,
    pub skipped_without_id: usize,
    /// The ID forced active from the query, if the query carried one.
    pub active: Option<TabId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Inserted,
    Updated,
    Reconciled(Option<TabId>),
}

pub struct SnapshotMerger;

impl SnapshotMerger {
    /// Merges a full set of live tabs into the store.
    ///
    /// After all tabs are folded in, the first live tab the host reports as active becomes
    /// the single active record; the query is the source of truth for "active".
    pub fn merge(store: &mut TabStore, live: &[HostTab], mode: MergeMode) -> MergeReport {
        let live_ids: HashSet<TabId> = live.iter().filter_map(|t| t.id).collect();
        let mut report = MergeReport::default();

        for tab in live {
            let Some(id) = tab.id else {
                report.skipped_without_id += 1;
                continue;
            };
            match Self::fold(store, tab, id, mode, &live_ids) {
                Outcome::Inserted => report.inserted.push(id),
                Outcome::Updated => report.updated.push(id),
                Outcome::Reconciled(old) => report.reconciled.push((old, id)),
            }
        }

        if let Some(active_id) = live.iter().find(|t| t.active).and_then(|t| t.id) {
            store.replace_active(active_id);
            report.active = Some(active_id);
        }

        debug!(
            inserted = report.inserted.len(),
            updated = report.updated.len(),
            reconciled = report.reconciled.len(),
            total = store.len(),
            "merged live snapshot"
        );
        report
    }

    /// Merges a single tab reported by a lifecycle event (no heuristic matching).
    ///
    /// Returns false when the tab carries no ID and was ignored.
    pub fn merge_tab(store: &mut TabStore, tab: &HostTab) -> bool {
        let Some(id) = tab.id else {
            return false;
        };
        Self::fold(store, tab, id, MergeMode::Incremental, &HashSet::new());
        if tab.active {
            store.replace_active(id);
        }
        true
    }

    fn fold(
        store: &mut TabStore,
        tab: &HostTab,
        id: TabId,
        mode: MergeMode,
        live_ids: &HashSet<TabId>,
    ) -> Outcome {
        if let Some(pos) = store.position(id) {
            if let Some(record) = store.record_mut(pos) {
                record.merge_host(tab);
            }
            return Outcome::Updated;
        }

        if mode == MergeMode::Reconcile {
            if let Some(pos) = Self::heuristic_candidate(store, tab, live_ids) {
                if let Some(record) = store.record_mut(pos) {
                    let old = record.id;
                    info!(old_id = ?old, new_id = id, "reconciled tab id");
                    record.id = Some(id);
                    record.merge_host(tab);
                    return Outcome::Reconciled(old);
                }
            }
        }

        store.push(TabRecord::from_host(tab));
        Outcome::Inserted
    }

    /// First record in store order that was active and shows the same url.
    /// Records whose ID is still live are skipped: they will be matched by ID.
    fn heuristic_candidate(
        store: &TabStore,
        tab: &HostTab,
        live_ids: &HashSet<TabId>,
    ) -> Option<usize> {
        let url = tab.url.as_deref()?;
        store.get().iter().position(|r| {
            r.is_active
                && r.url.as_deref() == Some(url)
                && r.id.map_or(true, |old| !live_ids.contains(&old))
        })
    }
}
