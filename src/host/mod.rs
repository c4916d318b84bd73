//! The tab-management host seam.
//!
//! The engine never touches a browser directly. It talks to an implementation of
//! [`TabHost`] for queries and mutations, and receives lifecycle notifications as
//! [`HostEvent`]s through the engine-owned event bus.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::errors::HostError;
use crate::types::message::Message;
use crate::types::tab::{HostTab, TabId};

pub mod simulated;

pub use simulated::SimulatedHost;

/// Which tabs a broad query returns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryScope {
    #[default]
    AllWindows,
    CurrentWindow,
}

/// A lifecycle notification from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Created(HostTab),
    Updated { tab_id: TabId, tab: HostTab },
    Removed { tab_id: TabId },
    Activated { tab_id: TabId },
}

/// Query and mutate operations offered by the host.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Lists live tabs. The result may omit tabs the host does not enumerate in this scope.
    async fn query_tabs(&self, scope: QueryScope) -> Result<Vec<HostTab>, HostError>;

    /// Looks up a single tab. Fails with [`HostError::TabNotFound`] when it no longer exists.
    async fn get_tab(&self, tab_id: TabId) -> Result<HostTab, HostError>;

    async fn create_tab(&self, url: &str) -> Result<HostTab, HostError>;

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError>;

    async fn duplicate_tab(&self, tab_id: TabId) -> Result<HostTab, HostError>;

    /// Delivers a message to the UI surface living in the given tab, if any.
    async fn send_message(&self, tab_id: TabId, message: &Message) -> Result<(), HostError>;
}
