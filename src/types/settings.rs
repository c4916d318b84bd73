use serde::{Deserialize, Serialize};

/// User preferences rendered by the tab strip.
///
/// Every field falls back to its default when missing, so settings persisted by an
/// older build (with fewer fields) still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: ThemeMode,
    pub scroll_behavior: ScrollBehavior,
    pub tab_bar_position: TabBarPosition,
    pub tab_width: TabWidthMode,
    pub fixed_tab_width: u32,
    pub disable_in_pwa: bool,
    pub smart_titles: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::System,
            scroll_behavior: ScrollBehavior::HideOnScroll,
            tab_bar_position: TabBarPosition::Top,
            tab_width: TabWidthMode::Dynamic,
            fixed_tab_width: 150,
            disable_in_pwa: true,
            smart_titles: true,
        }
    }
}

impl UserSettings {
    /// Returns a copy with every field present in `patch` applied.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(theme) = patch.theme {
            next.theme = theme;
        }
        if let Some(scroll) = patch.scroll_behavior {
            next.scroll_behavior = scroll;
        }
        if let Some(position) = patch.tab_bar_position {
            next.tab_bar_position = position;
        }
        if let Some(width) = patch.tab_width {
            next.tab_width = width;
        }
        if let Some(px) = patch.fixed_tab_width {
            next.fixed_tab_width = px;
        }
        if let Some(flag) = patch.disable_in_pwa {
            next.disable_in_pwa = flag;
        }
        if let Some(flag) = patch.smart_titles {
            next.smart_titles = flag;
        }
        next
    }
}

/// A partial settings object; absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_behavior: Option<ScrollBehavior>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_bar_position: Option<TabBarPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_width: Option<TabWidthMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_tab_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_in_pwa: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_titles: Option<bool>,
}

impl From<&UserSettings> for SettingsPatch {
    fn from(settings: &UserSettings) -> Self {
        Self {
            theme: Some(settings.theme),
            scroll_behavior: Some(settings.scroll_behavior),
            tab_bar_position: Some(settings.tab_bar_position),
            tab_width: Some(settings.tab_width),
            fixed_tab_width: Some(settings.fixed_tab_width),
            disable_in_pwa: Some(settings.disable_in_pwa),
            smart_titles: Some(settings.smart_titles),
        }
    }
}

/// Color theme selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    System,
    Light,
    Dark,
}

/// Whether the strip stays visible while the page scrolls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollBehavior {
    AlwaysShow,
    HideOnScroll,
}

/// Edge of the viewport the strip is attached to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TabBarPosition {
    Top,
    Bottom,
}

/// How tab widths are computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TabWidthMode {
    Dynamic,
    Fixed,
}
