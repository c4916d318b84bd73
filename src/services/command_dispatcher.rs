//! Command Dispatcher: applies UI intents to the host and the store.
//!
//! Every intent goes through two independent transitions:
//!
//! 1. [`CommandDispatcher::apply_optimistic`] is synchronous and touches only the store.
//!    It returns a [`PendingIntent`] describing what still has to happen.
//! 2. [`CommandDispatcher::confirm`] issues the host call and, if it fails, decides
//!    whether the optimistic change stands (the tab really is gone) or is reverted.
//!
//! The host's own lifecycle events may arrive before or after either step; removal is
//! idempotent, so the order does not matter.

use std::sync::Arc;

use tracing::{info, warn};

use crate::host::TabHost;
use crate::managers::tab_store::{SharedTabStore, TabStore, TabStoreTrait};
use crate::types::errors::HostError;
use crate::types::message::Message;
use crate::types::tab::{HostTab, TabId, TabRecord};

/// A user intent coming from a UI surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Switch(TabId),
    Close(TabId),
    CloseOthers(TabId),
    New,
    Duplicate(TabId),
}

impl Intent {
    /// Extracts the intent carried by a UI message, if it is one.
    pub fn from_message(message: &Message) -> Option<Intent> {
        match *message {
            Message::TabSwitch { tab_id } => Some(Intent::Switch(tab_id)),
            Message::TabClose { tab_id } => Some(Intent::Close(tab_id)),
            Message::TabCloseOthers { tab_id } => Some(Intent::CloseOthers(tab_id)),
            Message::TabNew => Some(Intent::New),
            Message::TabDuplicate { tab_id } => Some(Intent::Duplicate(tab_id)),
            _ => None,
        }
    }
}

/// Work left for [`CommandDispatcher::confirm`] after the optimistic step.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingIntent {
    Switch(TabId),
    /// `removed` holds the dropped records with their former positions, for reverting.
    Close {
        tab_id: TabId,
        removed: Vec<(usize, TabRecord)>,
    },
    CloseOthers {
        keep: TabId,
        targets: Vec<TabId>,
        removed: Vec<(usize, TabRecord)>,
    },
    New,
    Duplicate(TabId),
    /// Nothing to do (e.g. close-others with no other tabs).
    Noop,
}

impl PendingIntent {
    /// Whether the optimistic step changed the store and needs a commit.
    pub fn changed_store(&self) -> bool {
        match self {
            PendingIntent::Close { removed, .. } | PendingIntent::CloseOthers { removed, .. } => {
                !removed.is_empty()
            }
            _ => false,
        }
    }
}

/// How the host answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Confirmed,
    /// The host did not know these tabs; they were removed from the store.
    GhostsRemoved(Vec<TabId>),
    /// The host still has these tabs; their records were put back.
    Reverted(Vec<TabId>),
    /// The host call failed with no store consequence.
    Failed(HostError),
}

impl Confirmation {
    /// Whether confirming changed the store and needs a commit.
    pub fn changed_store(&self) -> bool {
        match self {
            Confirmation::GhostsRemoved(ids) | Confirmation::Reverted(ids) => !ids.is_empty(),
            _ => false,
        }
    }
}

pub struct CommandDispatcher {
    host: Arc<dyn TabHost>,
    new_tab_url: String,
}

impl CommandDispatcher {
    pub fn new(host: Arc<dyn TabHost>, new_tab_url: &str) -> Self {
        Self {
            host,
            new_tab_url: new_tab_url.to_string(),
        }
    }

    /// Applies the store-side effect of `intent` without waiting for the host.
    ///
    /// Close drops the record; close-others computes its target set from the store as it
    /// is right now and collapses the store to the kept tab. Both happen before any
    /// suspension point, so a tab created afterwards is never targeted.
    pub fn apply_optimistic(&self, store: &SharedTabStore, intent: Intent) -> PendingIntent {
        match intent {
            Intent::Switch(tab_id) => PendingIntent::Switch(tab_id),
            Intent::New => PendingIntent::New,
            Intent::Duplicate(tab_id) => PendingIntent::Duplicate(tab_id),
            Intent::Close(tab_id) => {
                let removed = store.with(|s| take_where(s, |r| r.id == Some(tab_id)));
                PendingIntent::Close { tab_id, removed }
            }
            Intent::CloseOthers(keep) => store.with(|s| {
                let targets: Vec<TabId> = s.ids().into_iter().filter(|id| *id != keep).collect();
                if targets.is_empty() {
                    return PendingIntent::Noop;
                }
                let removed = take_where(s, |r| r.id != Some(keep));
                PendingIntent::CloseOthers {
                    keep,
                    targets,
                    removed,
                }
            }),
        }
    }

    /// Issues the host call for a pending intent and settles the store accordingly.
    pub async fn confirm(&self, store: &SharedTabStore, pending: PendingIntent) -> Confirmation {
        match pending {
            PendingIntent::Noop => Confirmation::Confirmed,
            PendingIntent::Switch(tab_id) => match self.host.activate_tab(tab_id).await {
                Ok(()) => Confirmation::Confirmed,
                Err(e) => {
                    warn!(tab_id, error = %e, "switch failed, removing ghost tab");
                    store.with(|s| s.remove(tab_id));
                    Confirmation::GhostsRemoved(vec![tab_id])
                }
            },
            PendingIntent::New => match self.host.create_tab(&self.new_tab_url).await {
                Ok(_) => Confirmation::Confirmed,
                Err(e) => {
                    warn!(error = %e, "failed to open new tab");
                    Confirmation::Failed(e)
                }
            },
            PendingIntent::Duplicate(tab_id) => match self.host.duplicate_tab(tab_id).await {
                Ok(_) => Confirmation::Confirmed,
                Err(e) => {
                    warn!(tab_id, error = %e, "failed to duplicate tab");
                    Confirmation::Failed(e)
                }
            },
            PendingIntent::Close { tab_id, removed } => {
                self.confirm_removal(store, vec![tab_id], removed).await
            }
            PendingIntent::CloseOthers {
                targets, removed, ..
            } => self.confirm_removal(store, targets, removed).await,
        }
    }

    /// Removes `targets` in the host. On failure each target is probed: tabs the host no
    /// longer has stay removed, the rest are retried once and restored if that fails too.
    async fn confirm_removal(
        &self,
        store: &SharedTabStore,
        targets: Vec<TabId>,
        removed: Vec<(usize, TabRecord)>,
    ) -> Confirmation {
        let err = match self.host.remove_tabs(&targets).await {
            Ok(()) => return Confirmation::Confirmed,
            Err(e) => e,
        };
        warn!(count = targets.len(), error = %err, "tab removal failed, probing targets");

        let mut survivors: Vec<HostTab> = Vec::new();
        let mut ghosts = Vec::new();
        for &tab_id in &targets {
            match self.host.get_tab(tab_id).await {
                Ok(tab) => survivors.push(tab),
                Err(_) => ghosts.push(tab_id),
            }
        }

        if survivors.is_empty() {
            return Confirmation::GhostsRemoved(ghosts);
        }
        if !ghosts.is_empty() {
            let retry: Vec<TabId> = survivors.iter().filter_map(|t| t.id).collect();
            if self.host.remove_tabs(&retry).await.is_ok() {
                info!(ghosts = ghosts.len(), "removed tabs after dropping ghost targets");
                return Confirmation::GhostsRemoved(ghosts);
            }
        }

        let restored = store.with(|s| {
            let mut restored = Vec::new();
            for (position, record) in &removed {
                let Some(live) = survivors.iter().find(|t| t.id.is_some() && t.id == record.id) else {
                    continue;
                };
                let mut record = record.clone();
                record.merge_host(live);
                s.insert_at(*position, record);
                if live.active {
                    s.replace_active(live.id.unwrap_or_default());
                }
                restored.extend(live.id);
            }
            restored
        });
        if restored.is_empty() {
            warn!(error = %err, "tab removal failed, nothing to revert");
            return Confirmation::Failed(err);
        }
        warn!(count = restored.len(), "reverted optimistic removal");
        Confirmation::Reverted(restored)
    }
}

/// Removes every record matching `pred`, returning them with their former positions.
fn take_where<F>(store: &mut TabStore, pred: F) -> Vec<(usize, TabRecord)>
where
    F: Fn(&TabRecord) -> bool,
{
    let taken: Vec<(usize, TabRecord)> = store
        .get()
        .iter()
        .enumerate()
        .filter(|(_, r)| pred(r))
        .map(|(i, r)| (i, r.clone()))
        .collect();
    store.retain_ids(|r| !pred(r));
    taken
}
