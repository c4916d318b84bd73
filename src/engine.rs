//! The reconciliation engine: owns the tab store and wires every component together.
//!
//! [`Engine`] is a cheap, cloneable handle. Host lifecycle events come in through
//! [`Engine::run`] (or [`Engine::handle_event`]), UI messages through
//! [`Engine::handle_message`]. Every store change ends in a commit: persist, then
//! broadcast `SYNC_TABS` to all UI surfaces.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::host::{HostEvent, TabHost};
use crate::managers::ghost_pruner::{GhostPruner, PruneReport};
use crate::managers::snapshot_merger::{MergeMode, MergeReport, SnapshotMerger};
use crate::managers::tab_store::{SharedTabStore, TabStoreTrait};
use crate::services::command_dispatcher::{CommandDispatcher, Confirmation, Intent};
use crate::services::debouncer::Debouncer;
use crate::services::event_bus::EventStream;
use crate::services::gateway::{BroadcastGateway, CommitReport};
use crate::services::settings_store::SettingsStore;
use crate::storage::{load_json, KeyValueStorage};
use crate::types::errors::{EngineError, SettingsError, StorageError};
use crate::types::message::Message;
use crate::types::settings::{SettingsPatch, UserSettings};
use crate::types::tab::{TabId, TabRecord};

/// Reply to a UI message.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Answer to `GET_TABS`.
    Tabs(Vec<TabRecord>),
    Ack,
    /// The message is not meant for the engine (e.g. an echoed `SYNC_TABS`).
    Ignored,
}

/// Outcome of a resync pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResyncReport {
    pub merge: MergeReport,
    /// Empty for the debounced resync, which does not prune.
    pub prune: PruneReport,
    pub commit: CommitReport,
}

struct EngineInner {
    config: EngineConfig,
    host: Arc<dyn TabHost>,
    storage: Arc<dyn KeyValueStorage>,
    store: SharedTabStore,
    gateway: BroadcastGateway,
    dispatcher: CommandDispatcher,
    settings: SettingsStore,
    debouncer: Debouncer,
    /// Serializes initialization; holds whether it completed.
    init_gate: tokio::sync::Mutex<bool>,
    initialized: AtomicBool,
}

#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(config: EngineConfig, host: Arc<dyn TabHost>, storage: Arc<dyn KeyValueStorage>) -> Self {
        let gateway = BroadcastGateway::new(host.clone(), storage.clone(), &config.cached_tabs_key);
        let dispatcher = CommandDispatcher::new(host.clone(), &config.new_tab_url);
        let settings = SettingsStore::new(storage.clone(), &config.settings_key);
        let debouncer = Debouncer::new(config.debounce_delay());
        Self {
            inner: Arc::new(EngineInner {
                config,
                host,
                storage,
                store: SharedTabStore::default(),
                gateway,
                dispatcher,
                settings,
                debouncer,
                init_gate: tokio::sync::Mutex::new(false),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    /// Current ordered snapshot of the store.
    pub fn tabs(&self) -> Vec<TabRecord> {
        self.inner.store.snapshot()
    }

    pub fn find_tab(&self, tab_id: TabId) -> Option<TabRecord> {
        self.inner.store.with(|s| s.find(tab_id).cloned())
    }

    pub fn contains_tab(&self, tab_id: TabId) -> bool {
        self.inner.store.contains(tab_id)
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.inner.store.with(|s| s.active_id())
    }

    pub fn settings(&self) -> UserSettings {
        self.inner.settings.get()
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.inner.debouncer
    }

    // ─── Initialization ───

    /// Loads the cached snapshot, merges it with the live tabs, prunes ghosts and commits.
    ///
    /// Runs at most once; concurrent callers wait for the first to finish. If loading or
    /// querying fails the engine stays un-initialized and the next call retries.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        let mut done = self.inner.init_gate.lock().await;
        if *done {
            return Ok(());
        }

        self.inner.settings.load().await;

        let cached = self.load_cached().await.inspect_err(|e| {
            error!(error = %e, "initialization failed: could not load cached tabs");
        })?;
        let live = self
            .inner
            .host
            .query_tabs(self.inner.config.query_scope)
            .await
            .inspect_err(|e| error!(error = %e, "initialization failed: could not query tabs"))?;
        info!(cached = cached.len(), live = live.len(), "loaded cached tabs");

        self.inner.store.with(|s| {
            s.seed(cached);
            SnapshotMerger::merge(s, &live, MergeMode::Reconcile)
        });
        if self.inner.config.prune_on_init {
            GhostPruner::prune(&self.inner.store, &live, self.inner.host.as_ref()).await;
        }

        *done = true;
        self.inner.initialized.store(true, Ordering::SeqCst);
        drop(done);

        let report = self.commit().await;
        info!(
            tabs = self.inner.store.with(|s| s.len()),
            persisted = report.persisted,
            "engine initialized"
        );
        Ok(())
    }

    pub async fn ensure_initialized(&self) -> Result<(), EngineError> {
        if self.is_initialized() {
            return Ok(());
        }
        self.initialize().await
    }

    /// An undecodable snapshot is discarded rather than blocking startup forever.
    async fn load_cached(&self) -> Result<Vec<TabRecord>, StorageError> {
        let key = &self.inner.config.cached_tabs_key;
        match load_json::<Vec<TabRecord>>(self.inner.storage.as_ref(), key).await {
            Ok(cached) => Ok(cached.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                warn!(error = %e, "discarding unreadable cached tabs");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    // ─── Commit ───

    /// Persists and broadcasts the current store.
    ///
    /// Before initialization the snapshot is only broadcast: persisting a partial store
    /// would overwrite the cache that initialization still has to load.
    pub async fn commit(&self) -> CommitReport {
        let snapshot = self.inner.store.snapshot();
        if self.is_initialized() {
            return self.inner.gateway.commit(snapshot).await;
        }
        debug!(count = snapshot.len(), "not initialized, broadcasting without persisting");
        let delivery = self.inner.gateway.broadcast(&Message::SyncTabs { payload: snapshot }).await;
        CommitReport {
            persisted: false,
            delivery,
        }
    }

    // ─── Host events ───

    /// Drains host lifecycle events in delivery order until every publisher is gone.
    pub async fn run(&self, mut events: EventStream) {
        while let Some(event) = events.next().await {
            self.handle_event(event).await;
        }
        debug!("event stream closed");
    }

    pub async fn handle_event(&self, event: HostEvent) {
        let store = &self.inner.store;
        match event {
            HostEvent::Created(tab) => {
                if store.with(|s| SnapshotMerger::merge_tab(s, &tab)) {
                    self.commit().await;
                }
            }
            HostEvent::Updated { tab_id, mut tab } => {
                tab.id.get_or_insert(tab_id);
                store.with(|s| SnapshotMerger::merge_tab(s, &tab));
                self.schedule_resync();
            }
            HostEvent::Removed { tab_id } => {
                store.with(|s| s.remove(tab_id));
                self.commit().await;
            }
            HostEvent::Activated { tab_id } => {
                store.with(|s| s.replace_active(tab_id));
                match self.inner.host.get_tab(tab_id).await {
                    Ok(tab) => {
                        store.with(|s| SnapshotMerger::merge_tab(s, &tab));
                    }
                    Err(e) => warn!(tab_id, error = %e, "could not look up activated tab"),
                }
                self.commit().await;
            }
        }
    }

    // ─── Resync ───

    /// Arms the debouncer; the last call within the quiet period triggers one resync.
    pub fn schedule_resync(&self) {
        let engine = self.clone();
        self.inner.debouncer.notify(async move {
            if let Err(e) = engine.resync().await {
                warn!(error = %e, "debounced resync failed");
            }
        });
    }

    /// Re-queries live tabs, merges them by ID only, and commits. Does not prune.
    pub async fn resync(&self) -> Result<ResyncReport, EngineError> {
        let live = self.inner.host.query_tabs(self.inner.config.query_scope).await?;
        let merge = self
            .inner
            .store
            .with(|s| SnapshotMerger::merge(s, &live, MergeMode::Incremental));
        let commit = self.commit().await;
        Ok(ResyncReport {
            merge,
            prune: PruneReport::default(),
            commit,
        })
    }

    /// Re-queries live tabs, merges them with identity reconciliation, prunes ghosts and commits.
    pub async fn full_resync(&self) -> Result<ResyncReport, EngineError> {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }
        let live = self.inner.host.query_tabs(self.inner.config.query_scope).await?;
        let merge = self
            .inner
            .store
            .with(|s| SnapshotMerger::merge(s, &live, MergeMode::Reconcile));
        let prune = GhostPruner::prune(&self.inner.store, &live, self.inner.host.as_ref()).await;
        let commit = self.commit().await;
        Ok(ResyncReport { merge, prune, commit })
    }

    /// Starts the periodic full resync if an interval is configured.
    ///
    /// The task holds only a weak reference and ends once the last engine handle is dropped.
    pub fn spawn_periodic_resync(&self) -> Option<JoinHandle<()>> {
        let period = self.inner.config.resync_interval()?;
        let weak: Weak<EngineInner> = Arc::downgrade(&self.inner);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let engine = Engine { inner };
                match engine.full_resync().await {
                    Ok(report) => debug!(pruned = report.prune.pruned.len(), "periodic resync done"),
                    Err(EngineError::NotInitialized) => debug!("skipping periodic resync before initialization"),
                    Err(e) => warn!(error = %e, "periodic resync failed"),
                }
            }
        }))
    }

    // ─── UI messages ───

    /// Applies a UI intent: optimistic store change and commit, then host confirmation
    /// and another commit if it changed the store.
    pub async fn dispatch(&self, intent: Intent) -> Confirmation {
        let dispatcher = &self.inner.dispatcher;
        let pending = dispatcher.apply_optimistic(&self.inner.store, intent);
        if pending.changed_store() {
            self.commit().await;
        }
        let confirmation = dispatcher.confirm(&self.inner.store, pending).await;
        if confirmation.changed_store() {
            self.commit().await;
        }
        confirmation
    }

    /// Persists a settings patch, then broadcasts the full merged settings to every UI.
    ///
    /// A storage failure is logged and the in-memory settings are still broadcast.
    pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<UserSettings, SettingsError> {
        let settings = match self.inner.settings.update(patch).await {
            Ok(settings) => settings,
            Err(SettingsError::Storage(e)) => {
                error!(error = %e, "failed to persist settings");
                self.inner.settings.get()
            }
            Err(e) => return Err(e),
        };
        let message = Message::UpdateSettings {
            payload: SettingsPatch::from(&settings),
        };
        self.inner.gateway.broadcast(&message).await;
        Ok(settings)
    }

    /// Entry point for every message a UI surface sends.
    pub async fn handle_message(&self, message: Message) -> Result<Reply, EngineError> {
        debug!(kind = message.kind(), "received message");
        if let Some(intent) = Intent::from_message(&message) {
            self.dispatch(intent).await;
            return Ok(Reply::Ack);
        }
        match message {
            Message::GetTabs => {
                if let Err(e) = self.ensure_initialized().await {
                    warn!(error = %e, "answering GET_TABS without initialization");
                }
                Ok(Reply::Tabs(self.tabs()))
            }
            Message::UpdateSettings { payload } => {
                self.update_settings(&payload).await?;
                Ok(Reply::Ack)
            }
            _ => Ok(Reply::Ignored),
        }
    }
}
