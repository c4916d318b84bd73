//! In-process host used by the demo, the bridge binary and the test suite.
//!
//! Behaves like a browser's tab API: sequential integer IDs, one active tab per window,
//! lifecycle events published after every mutation. It can also misbehave on request:
//! hide tabs from broad queries, fail specific calls, or reassign every ID as a
//! browser restart would.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{HostEvent, QueryScope, TabHost};
use crate::services::event_bus::EventBus;
use crate::types::errors::HostError;
use crate::types::message::Message;
use crate::types::tab::{HostTab, TabId, WindowId};

/// A mutating call the host received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Create(String),
    Activate(TabId),
    Remove(Vec<TabId>),
    Duplicate(TabId),
}

#[derive(Debug, Default)]
struct Failures {
    query: bool,
    activate: bool,
    remove: bool,
}

#[derive(Debug)]
struct HostState {
    tabs: Vec<HostTab>,
    next_id: TabId,
    current_window: WindowId,
    hidden: HashSet<TabId>,
    receivers: HashSet<TabId>,
    delivered: Vec<(TabId, Message)>,
    calls: Vec<HostCall>,
    failures: Failures,
}

impl HostState {
    fn find_tab_index(&self, tab_id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == Some(tab_id))
    }

    fn allocate_id(&mut self) -> TabId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Makes `tab_id` the only active tab of its window.
    fn activate(&mut self, tab_id: TabId) {
        let window = self
            .find_tab_index(tab_id)
            .and_then(|i| self.tabs[i].window_id);
        for tab in &mut self.tabs {
            if tab.window_id == window {
                let on = tab.id == Some(tab_id);
                tab.active = on;
                tab.highlighted = on;
            }
        }
    }

    /// Rewrites each tab's index to its position within its window.
    fn reindex(&mut self) {
        let windows: Vec<Option<WindowId>> = self.tabs.iter().map(|t| t.window_id).collect();
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.index = windows[..i].iter().filter(|w| **w == tab.window_id).count() as u32;
        }
    }
}

/// In-memory [`TabHost`].
pub struct SimulatedHost {
    state: Mutex<HostState>,
    bus: Mutex<Option<EventBus>>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                tabs: Vec::new(),
                next_id: 1,
                current_window: 1,
                hidden: HashSet::new(),
                receivers: HashSet::new(),
                delivered: Vec::new(),
                calls: Vec::new(),
                failures: Failures::default(),
            }),
            bus: Mutex::new(None),
        }
    }

    /// Routes lifecycle events to the engine's bus from now on.
    pub fn attach_bus(&self, bus: EventBus) {
        *self.bus.lock().unwrap_or_else(|e| e.into_inner()) = Some(bus);
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, events: Vec<HostEvent>) {
        let bus = self.bus.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bus) = bus.as_ref() {
            for event in events {
                bus.publish(event);
            }
        }
    }

    /// Opens a tab as if the user did it in the browser. Every tab gets a listening UI.
    pub fn open_tab(&self, url: &str, window_id: WindowId, active: bool) -> TabId {
        let (tab, id) = {
            let mut state = self.state();
            let id = state.allocate_id();
            let mut tab = HostTab::new(id, url);
            tab.window_id = Some(window_id);
            state.tabs.push(tab);
            state.receivers.insert(id);
            state.reindex();
            if active {
                state.activate(id);
            }
            let idx = state.find_tab_index(id).unwrap_or_default();
            (state.tabs[idx].clone(), id)
        };
        let mut events = vec![HostEvent::Created(tab)];
        if active {
            events.push(HostEvent::Activated { tab_id: id });
        }
        self.publish(events);
        id
    }

    /// Closes a tab from outside the engine (user closed it in the browser).
    pub fn close_externally(&self, tab_id: TabId) -> bool {
        let removed = {
            let mut state = self.state();
            match state.find_tab_index(tab_id) {
                Some(idx) => {
                    state.tabs.remove(idx);
                    state.receivers.remove(&tab_id);
                    state.hidden.remove(&tab_id);
                    state.reindex();
                    true
                }
                None => false,
            }
        };
        if removed {
            self.publish(vec![HostEvent::Removed { tab_id }]);
        }
        removed
    }

    /// Navigates a tab, publishing the burst of updates a page load produces.
    pub fn navigate(&self, tab_id: TabId, url: &str) -> bool {
        let snapshots = {
            let mut state = self.state();
            let Some(idx) = state.find_tab_index(tab_id) else {
                return false;
            };
            let mut snapshots = Vec::new();
            {
                let tab = &mut state.tabs[idx];
                tab.url = Some(url.to_string());
                tab.status = Some(crate::types::tab::TabStatus::Loading);
                snapshots.push(tab.clone());
                tab.title = Some(url.to_string());
                snapshots.push(tab.clone());
                tab.status = Some(crate::types::tab::TabStatus::Complete);
                snapshots.push(tab.clone());
            }
            snapshots
        };
        self.publish(
            snapshots
                .into_iter()
                .map(|tab| HostEvent::Updated { tab_id, tab })
                .collect(),
        );
        true
    }

    /// Reassigns every tab a fresh ID, as after a browser restart. No events are published.
    pub fn restart(&self) -> Vec<(TabId, TabId)> {
        let mut state = self.state();
        let mut mapping = Vec::new();
        for i in 0..state.tabs.len() {
            let new_id = state.allocate_id();
            if let Some(old) = state.tabs[i].id.replace(new_id) {
                mapping.push((old, new_id));
            }
        }
        let receivers: HashSet<TabId> = mapping
            .iter()
            .filter(|(old, _)| state.receivers.contains(old))
            .map(|(_, new)| *new)
            .collect();
        state.receivers = receivers;
        state.hidden.clear();
        state.delivered.clear();
        mapping
    }

    /// Excludes a tab from broad queries; direct lookups still find it.
    pub fn hide_from_query(&self, tab_id: TabId) {
        self.state().hidden.insert(tab_id);
    }

    /// Removes the UI surface from a tab, so message delivery to it fails.
    pub fn detach_receiver(&self, tab_id: TabId) {
        self.state().receivers.remove(&tab_id);
    }

    pub fn set_current_window(&self, window_id: WindowId) {
        self.state().current_window = window_id;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.state().failures.query = fail;
    }

    pub fn fail_activations(&self, fail: bool) {
        self.state().failures.activate = fail;
    }

    pub fn fail_removals(&self, fail: bool) {
        self.state().failures.remove = fail;
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.state().tabs.iter().filter_map(|t| t.id).collect()
    }

    pub fn active_tab(&self, window_id: WindowId) -> Option<TabId> {
        self.state()
            .tabs
            .iter()
            .find(|t| t.active && t.window_id == Some(window_id))
            .and_then(|t| t.id)
    }

    /// Messages delivered so far, in order.
    pub fn delivered(&self) -> Vec<(TabId, Message)> {
        self.state().delivered.clone()
    }

    pub fn clear_delivered(&self) {
        self.state().delivered.clear();
    }

    /// Mutating calls received so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabHost for SimulatedHost {
    async fn query_tabs(&self, scope: QueryScope) -> Result<Vec<HostTab>, HostError> {
        let state = self.state();
        if state.failures.query {
            return Err(HostError::Unavailable("tabs.query failed".to_string()));
        }
        Ok(state
            .tabs
            .iter()
            .filter(|t| t.id.map_or(true, |id| !state.hidden.contains(&id)))
            .filter(|t| match scope {
                QueryScope::AllWindows => true,
                QueryScope::CurrentWindow => t.window_id == Some(state.current_window),
            })
            .cloned()
            .collect())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<HostTab, HostError> {
        let state = self.state();
        state
            .find_tab_index(tab_id)
            .map(|idx| state.tabs[idx].clone())
            .ok_or(HostError::TabNotFound(tab_id))
    }

    /// New tabs open in the current window and take focus.
    async fn create_tab(&self, url: &str) -> Result<HostTab, HostError> {
        let window = {
            let mut state = self.state();
            state.calls.push(HostCall::Create(url.to_string()));
            state.current_window
        };
        let id = self.open_tab(url, window, true);
        self.get_tab(id).await
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        {
            let mut state = self.state();
            state.calls.push(HostCall::Activate(tab_id));
            if state.failures.activate {
                return Err(HostError::Unavailable("tabs.update failed".to_string()));
            }
            if state.find_tab_index(tab_id).is_none() {
                return Err(HostError::TabNotFound(tab_id));
            }
            state.activate(tab_id);
        }
        self.publish(vec![HostEvent::Activated { tab_id }]);
        Ok(())
    }

    /// All-or-nothing: an unknown ID fails the whole call.
    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        {
            let mut state = self.state();
            state.calls.push(HostCall::Remove(tab_ids.to_vec()));
            if state.failures.remove {
                return Err(HostError::Rejected("tabs.remove failed".to_string()));
            }
            if let Some(missing) = tab_ids.iter().find(|id| state.find_tab_index(**id).is_none()) {
                return Err(HostError::TabNotFound(*missing));
            }
            state.tabs.retain(|t| t.id.map_or(true, |id| !tab_ids.contains(&id)));
            state.receivers.retain(|id| !tab_ids.contains(id));
            state.hidden.retain(|id| !tab_ids.contains(id));
            state.reindex();
        }
        self.publish(
            tab_ids
                .iter()
                .map(|&tab_id| HostEvent::Removed { tab_id })
                .collect(),
        );
        Ok(())
    }

    /// The copy lands right after its source and becomes active.
    async fn duplicate_tab(&self, tab_id: TabId) -> Result<HostTab, HostError> {
        let copy = {
            let mut state = self.state();
            state.calls.push(HostCall::Duplicate(tab_id));
            let idx = state
                .find_tab_index(tab_id)
                .ok_or(HostError::TabNotFound(tab_id))?;
            let new_id = state.allocate_id();
            let mut copy = state.tabs[idx].clone();
            copy.id = Some(new_id);
            copy.opener_tab_id = Some(tab_id);
            copy.pinned = false;
            state.tabs.insert(idx + 1, copy);
            state.receivers.insert(new_id);
            state.reindex();
            state.activate(new_id);
            state.tabs[idx + 1].clone()
        };
        let new_id = copy.id.unwrap_or_default();
        self.publish(vec![
            HostEvent::Created(copy.clone()),
            HostEvent::Activated { tab_id: new_id },
        ]);
        Ok(copy)
    }

    async fn send_message(&self, tab_id: TabId, message: &Message) -> Result<(), HostError> {
        let mut state = self.state();
        if state.find_tab_index(tab_id).is_none() {
            return Err(HostError::TabNotFound(tab_id));
        }
        if !state.receivers.contains(&tab_id) {
            return Err(HostError::NoReceiver(tab_id));
        }
        state.delivered.push((tab_id, message.clone()));
        Ok(())
    }
}
