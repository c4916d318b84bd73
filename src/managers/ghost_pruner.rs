//! Ghost Pruner: drops records that no longer correspond to a real tab.
//!
//! A record survives if its ID is in the live set, or if a direct lookup still finds
//! the tab (broad queries may skip background or other-window tabs). Records without
//! an ID have nothing to validate and are kept.

use std::collections::HashSet;

use tracing::info;

use crate::host::TabHost;
use crate::managers::tab_store::{SharedTabStore, TabStore, TabStoreTrait};
use crate::types::tab::{HostTab, TabId};

/// Outcome of one pruning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Not in the live set, but the host still knows them.
    pub kept_non_visible: Vec<TabId>,
    pub pruned: Vec<TabId>,
}

pub struct GhostPruner;

impl GhostPruner {
    /// Store IDs absent from the live set, in store order.
    pub fn suspects(store: &TabStore, live: &[HostTab]) -> Vec<TabId> {
        let live_ids: HashSet<TabId> = live.iter().filter_map(|t| t.id).collect();
        store
            .ids()
            .into_iter()
            .filter(|id| !live_ids.contains(id))
            .collect()
    }

    /// Probes every suspect against the host and removes the ones it no longer has.
    ///
    /// The store is only locked before and after the probes; removal works on whatever
    /// the store holds by then.
    pub async fn prune(store: &SharedTabStore, live: &[HostTab], host: &dyn TabHost) -> PruneReport {
        let suspects = store.with(|s| Self::suspects(s, live));
        let mut report = PruneReport::default();

        for tab_id in suspects {
            match host.get_tab(tab_id).await {
                Ok(_) => {
                    info!(tab_id, "kept non-visible tab");
                    report.kept_non_visible.push(tab_id);
                }
                Err(_) => report.pruned.push(tab_id),
            }
        }

        if !report.pruned.is_empty() {
            store.with(|s| {
                for &tab_id in &report.pruned {
                    let title = s.find(tab_id).map(|r| r.label().to_string());
                    if s.remove(tab_id) {
                        info!(tab_id, title = title.as_deref().unwrap_or(""), "pruned ghost tab");
                    }
                }
            });
        }
        report
    }
}
