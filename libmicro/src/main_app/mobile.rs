//! Device-level UI state

use serde::{Deserialize, Serialize};

use crate::store::{Action, Slice, StateTree};

pub const MOBILE_KEY: &str = "mobile";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileState {
    pub theme: Theme,
    pub is_online: bool,
}

impl Default for MobileState {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            is_online: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum MobileAction {
    SetTheme(Theme),
    SetOnlineStatus(bool),
}

impl MobileAction {
    pub fn kind(&self) -> &'static str {
        match self {
            MobileAction::SetTheme(_) => "mobile/setTheme",
            MobileAction::SetOnlineStatus(_) => "mobile/setOnlineStatus",
        }
    }
}

pub struct MobileSlice;

impl Slice for MobileSlice {
    type State = MobileState;

    fn reduce(&self, state: MobileState, action: &Action) -> MobileState {
        match action {
            Action::Mobile(MobileAction::SetTheme(theme)) => MobileState { theme: *theme, ..state },
            Action::Mobile(MobileAction::SetOnlineStatus(is_online)) => MobileState {
                is_online: *is_online,
                ..state
            },
            _ => state,
        }
    }
}

pub fn set_theme(theme: Theme) -> Action {
    MobileAction::SetTheme(theme).into()
}

pub fn set_online_status(is_online: bool) -> Action {
    MobileAction::SetOnlineStatus(is_online).into()
}

pub fn select_mobile(tree: &StateTree) -> MobileState {
    tree.get::<MobileState>(MOBILE_KEY).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = MobileState::default();
        assert_eq!(state.theme, Theme::Light);
        assert!(state.is_online);
    }

    #[test]
    fn test_reducer() {
        let state = MobileSlice.reduce(MobileState::default(), &set_theme(Theme::Dark));
        let state = MobileSlice.reduce(state, &set_online_status(false));
        assert_eq!(
            state,
            MobileState {
                theme: Theme::Dark,
                is_online: false,
            }
        );
    }

    #[test]
    fn test_theme_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Theme::Dark).unwrap(), "dark");
        let theme: Theme = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(theme, Theme::Light);
    }
}
