//! Tab Record Store: the engine's ordered ledger of tab records.
//!
//! Pure in-memory bookkeeping. All I/O (persisting, broadcasting, probing the host)
//! is the caller's job.

use std::sync::Mutex;

use crate::types::tab::{TabId, TabRecord};

/// Trait defining the tab store interface.
pub trait TabStoreTrait {
    fn get(&self) -> &[TabRecord];
    fn upsert(&mut self, record: TabRecord);
    fn remove(&mut self, tab_id: TabId) -> bool;
    fn replace_active(&mut self, tab_id: TabId) -> bool;
    fn find(&self, tab_id: TabId) -> Option<&TabRecord>;
    fn position(&self, tab_id: TabId) -> Option<usize>;
    fn ids(&self) -> Vec<TabId>;
    fn active_id(&self) -> Option<TabId>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}

/// Ordered mapping from tab ID to record. Insertion order is the fallback display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabStore {
    records: Vec<TabRecord>,
}

impl TabStore {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    /// Builds a store from a persisted snapshot, keeping its order.
    /// Later duplicates of an ID are dropped so ID uniqueness holds.
    pub fn from_snapshot(records: Vec<TabRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            match record.id {
                Some(id) if store.position(id).is_some() => continue,
                _ => store.records.push(record),
            }
        }
        store
    }

    /// Places cached records ahead of what is already in memory. Records already present
    /// (by ID) are fresher and win; cached duplicates are skipped. A record already active
    /// in memory also wins the active flag over the cache.
    pub fn seed(&mut self, cached: Vec<TabRecord>) {
        let current = std::mem::take(&mut self.records);
        let mut seeded = Self::from_snapshot(cached);
        seeded.records.retain(|r| match r.id {
            Some(id) => !current.iter().any(|c| c.id == Some(id)),
            None => true,
        });
        if current.iter().any(|c| c.is_active) {
            for record in &mut seeded.records {
                record.is_active = false;
            }
        }
        for record in current {
            seeded.upsert(record);
        }
        *self = seeded;
    }

    /// Mutable access to the record at `position`.
    pub(crate) fn record_mut(&mut self, position: usize) -> Option<&mut TabRecord> {
        self.records.get_mut(position)
    }

    /// Inserts `record` at `position` (clamped to the end). An existing record with the
    /// same ID is replaced in place instead.
    pub(crate) fn insert_at(&mut self, position: usize, record: TabRecord) {
        if let Some(existing) = record.id.and_then(|id| self.position(id)) {
            self.records[existing] = record;
            return;
        }
        let position = position.min(self.records.len());
        self.records.insert(position, record);
    }

    /// Appends a record without an ID check. The merger uses this for brand-new tabs.
    pub(crate) fn push(&mut self, record: TabRecord) {
        self.records.push(record);
    }

    /// Keeps only the records for which `keep` returns true. Returns the removed IDs.
    pub(crate) fn retain_ids<F>(&mut self, mut keep: F) -> Vec<TabId>
    where
        F: FnMut(&TabRecord) -> bool,
    {
        let mut removed = Vec::new();
        self.records.retain(|r| {
            let kept = keep(r);
            if !kept {
                if let Some(id) = r.id {
                    removed.push(id);
                }
            }
            kept
        });
        removed
    }

    /// Owned copy of the ordered records, for persisting and broadcasting.
    pub fn snapshot(&self) -> Vec<TabRecord> {
        self.records.clone()
    }
}

impl TabStoreTrait for TabStore {
    fn get(&self) -> &[TabRecord] {
        &self.records
    }

    /// Inserts the record, or replaces the one with the same ID in place.
    /// Records without an ID are always appended.
    fn upsert(&mut self, record: TabRecord) {
        match record.id.and_then(|id| self.position(id)) {
            Some(pos) => self.records[pos] = record,
            None => self.records.push(record),
        }
    }

    /// Removes the record with the given ID. Idempotent; returns whether anything was removed.
    fn remove(&mut self, tab_id: TabId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != Some(tab_id));
        self.records.len() != before
    }

    /// Marks the matching record active and every other record inactive.
    /// Returns false (and leaves zero active records) when nothing matches.
    fn replace_active(&mut self, tab_id: TabId) -> bool {
        let mut found = false;
        for record in &mut self.records {
            let is_winner = record.id == Some(tab_id);
            record.is_active = is_winner;
            found |= is_winner;
        }
        found
    }

    fn find(&self, tab_id: TabId) -> Option<&TabRecord> {
        self.records.iter().find(|r| r.id == Some(tab_id))
    }

    fn position(&self, tab_id: TabId) -> Option<usize> {
        self.records.iter().position(|r| r.id == Some(tab_id))
    }

    fn ids(&self) -> Vec<TabId> {
        self.records.iter().filter_map(|r| r.id).collect()
    }

    fn active_id(&self) -> Option<TabId> {
        self.records.iter().find(|r| r.is_active).and_then(|r| r.id)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The engine's single shared store.
///
/// Access goes through closures, so a lock can never be held across an `.await`:
/// every handler that suspends re-reads the store when it resumes.
#[derive(Debug, Default)]
pub struct SharedTabStore {
    inner: Mutex<TabStore>,
}

impl SharedTabStore {
    pub fn new(store: TabStore) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    /// Runs `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut TabStore) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn snapshot(&self) -> Vec<TabRecord> {
        self.with(|store| store.snapshot())
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.with(|store| store.ids())
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.with(|store| store.position(tab_id).is_some())
    }
}
