use serde::{Deserialize, Serialize};

/// Host-assigned tab identifier.
pub type TabId = i64;

/// Host-assigned window identifier.
pub type WindowId = i64;

/// Loading status as reported by the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    Unloaded,
}

/// Mute state of a tab, with the optional reason the host gives for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MutedInfo {
    pub muted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A live tab exactly as the host reports it from a query, a lookup or a lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HostTab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opener_tab_id: Option<TabId>,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub discarded: bool,
    #[serde(default)]
    pub auto_discardable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TabStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted_info: Option<MutedInfo>,
}

impl HostTab {
    /// Convenience constructor used by hosts and tests.
    pub fn new(id: TabId, url: &str) -> Self {
        Self {
            id: Some(id),
            url: Some(url.to_string()),
            title: Some(url.to_string()),
            status: Some(TabStatus::Complete),
            auto_discardable: true,
            ..Default::default()
        }
    }
}

/// One browser tab as the engine understands it: the host's fields plus derived flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opener_tab_id: Option<TabId>,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub discarded: bool,
    #[serde(default)]
    pub auto_discardable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TabStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted_info: Option<MutedInfo>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub is_playing_audio: bool,
    #[serde(default)]
    pub is_active: bool,
}

impl TabRecord {
    /// Builds a fresh record from a host snapshot.
    pub fn from_host(tab: &HostTab) -> Self {
        let mut record = Self::default();
        record.merge_host(tab);
        record
    }

    /// Folds a host snapshot into this record. Host-reported fields win; optional
    /// fields the host left out keep their stored value. Derived flags are recomputed.
    pub fn merge_host(&mut self, tab: &HostTab) {
        if tab.id.is_some() {
            self.id = tab.id;
        }
        self.index = tab.index;
        overlay(&mut self.window_id, &tab.window_id);
        overlay(&mut self.opener_tab_id, &tab.opener_tab_id);
        self.highlighted = tab.highlighted;
        self.active = tab.active;
        self.pinned = tab.pinned;
        self.incognito = tab.incognito;
        self.discarded = tab.discarded;
        self.auto_discardable = tab.auto_discardable;
        overlay(&mut self.url, &tab.url);
        overlay(&mut self.title, &tab.title);
        overlay(&mut self.fav_icon_url, &tab.fav_icon_url);
        overlay(&mut self.status, &tab.status);
        overlay(&mut self.width, &tab.width);
        overlay(&mut self.height, &tab.height);
        overlay(&mut self.session_id, &tab.session_id);
        overlay(&mut self.audible, &tab.audible);
        overlay(&mut self.muted_info, &tab.muted_info);

        self.is_loading = self.status == Some(TabStatus::Loading);
        self.is_playing_audio = self.audible.unwrap_or(false);
        self.is_active = tab.active;
    }

    /// Display label: title, falling back to url, then a placeholder.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.url.as_deref())
            .unwrap_or("untitled")
    }
}

fn overlay<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) {
    if let Some(value) = incoming {
        *slot = Some(value.clone());
    }
}
