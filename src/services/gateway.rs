//! Broadcast/Persist Gateway: makes a store snapshot durable, then pushes it to every UI surface.
//!
//! Persisting and broadcasting are sequential, not atomic. Storage is written first;
//! a failed write is logged and the broadcast still goes out. Delivery is best effort:
//! tabs without a listening surface are expected and silently skipped.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::host::{QueryScope, TabHost};
use crate::storage::{store_json, KeyValueStorage};
use crate::types::message::Message;
use crate::types::tab::TabRecord;

/// Per-surface delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

/// What a commit achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub persisted: bool,
    pub delivery: Delivery,
}

pub struct BroadcastGateway {
    host: Arc<dyn TabHost>,
    storage: Arc<dyn KeyValueStorage>,
    cached_tabs_key: String,
}

impl BroadcastGateway {
    pub fn new(host: Arc<dyn TabHost>, storage: Arc<dyn KeyValueStorage>, cached_tabs_key: &str) -> Self {
        Self {
            host,
            storage,
            cached_tabs_key: cached_tabs_key.to_string(),
        }
    }

    /// Persists the snapshot, then broadcasts it as `SYNC_TABS`.
    pub async fn commit(&self, snapshot: Vec<TabRecord>) -> CommitReport {
        let persisted = self.persist(&snapshot).await;
        let delivery = self.broadcast(&Message::SyncTabs { payload: snapshot }).await;
        CommitReport { persisted, delivery }
    }

    /// Overwrites the stored snapshot. Failures are logged, never propagated.
    pub async fn persist(&self, snapshot: &[TabRecord]) -> bool {
        match store_json(self.storage.as_ref(), &self.cached_tabs_key, snapshot).await {
            Ok(()) => {
                debug!(count = snapshot.len(), "state saved");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to persist tab snapshot");
                false
            }
        }
    }

    /// Sends `message` to every tab the host knows about.
    pub async fn broadcast(&self, message: &Message) -> Delivery {
        let targets = match self.host.query_tabs(QueryScope::AllWindows).await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(error = %e, kind = message.kind(), "could not enumerate broadcast targets");
                return Delivery::default();
            }
        };

        let mut delivery = Delivery::default();
        for tab_id in targets.iter().filter_map(|t| t.id) {
            match self.host.send_message(tab_id, message).await {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    debug!(tab_id, error = %e, "no surface received broadcast");
                    delivery.failed += 1;
                }
            }
        }
        delivery
    }
}
