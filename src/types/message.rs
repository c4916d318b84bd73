use serde::{Deserialize, Serialize};

use super::settings::SettingsPatch;
use super::tab::{TabId, TabRecord};

/// Messages exchanged between the engine and UI surfaces over the host's messaging channel.
///
/// Wire shape: `{"type": "TAB_SWITCH", "tabId": 4}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Message {
    /// Engine → UI: replace the displayed tab list.
    SyncTabs { payload: Vec<TabRecord> },
    TabSwitch { tab_id: TabId },
    TabClose { tab_id: TabId },
    TabNew,
    TabDuplicate { tab_id: TabId },
    TabCloseOthers { tab_id: TabId },
    /// UI → engine with a partial object; engine → UI with the full merged settings.
    UpdateSettings { payload: SettingsPatch },
    /// UI → engine: request the current snapshot.
    GetTabs,
}

impl Message {
    /// Wire name of the message type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::SyncTabs { .. } => "SYNC_TABS",
            Message::TabSwitch { .. } => "TAB_SWITCH",
            Message::TabClose { .. } => "TAB_CLOSE",
            Message::TabNew => "TAB_NEW",
            Message::TabDuplicate { .. } => "TAB_DUPLICATE",
            Message::TabCloseOthers { .. } => "TAB_CLOSE_OTHERS",
            Message::UpdateSettings { .. } => "UPDATE_SETTINGS",
            Message::GetTabs => "GET_TABS",
        }
    }
}
