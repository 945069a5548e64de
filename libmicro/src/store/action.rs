//! Actions for the reducer pattern
//!
//! Every state transition in every store is triggered by an [`Action`].
//! The set is closed: one variant per slice family, each wrapping that
//! slice's own action enum, so reducers match exhaustively.

use serde::{Deserialize, Serialize};

use crate::cache::ApiAction;
use crate::features::payments::{PaymentMethodsAction, PaymentSettingsAction, TransactionsAction};
use crate::features::support::TicketsAction;
use crate::main_app::mobile::MobileAction;
use crate::main_app::user::UserAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "slice", content = "action", rename_all = "camelCase")]
pub enum Action {
    // === Main app ===
    User(UserAction),
    Mobile(MobileAction),

    // === Payments ===
    Transactions(TransactionsAction),
    PaymentMethods(PaymentMethodsAction),
    PaymentSettings(PaymentSettingsAction),

    // === Support ===
    Tickets(TicketsAction),

    // === Cache clients ===
    Api(ApiAction),
}

impl Action {
    /// Stable `slice/action` name used in logs and store events
    pub fn kind(&self) -> &'static str {
        match self {
            Action::User(a) => a.kind(),
            Action::Mobile(a) => a.kind(),
            Action::Transactions(a) => a.kind(),
            Action::PaymentMethods(a) => a.kind(),
            Action::PaymentSettings(a) => a.kind(),
            Action::Tickets(a) => a.kind(),
            Action::Api(a) => a.kind(),
        }
    }
}

impl From<UserAction> for Action {
    fn from(action: UserAction) -> Self {
        Action::User(action)
    }
}

impl From<MobileAction> for Action {
    fn from(action: MobileAction) -> Self {
        Action::Mobile(action)
    }
}

impl From<TransactionsAction> for Action {
    fn from(action: TransactionsAction) -> Self {
        Action::Transactions(action)
    }
}

impl From<PaymentMethodsAction> for Action {
    fn from(action: PaymentMethodsAction) -> Self {
        Action::PaymentMethods(action)
    }
}

impl From<PaymentSettingsAction> for Action {
    fn from(action: PaymentSettingsAction) -> Self {
        Action::PaymentSettings(action)
    }
}

impl From<TicketsAction> for Action {
    fn from(action: TicketsAction) -> Self {
        Action::Tickets(action)
    }
}

impl From<ApiAction> for Action {
    fn from(action: ApiAction) -> Self {
        Action::Api(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_app::mobile::Theme;

    #[test]
    fn test_kind_names_slice_and_action() {
        assert_eq!(Action::Mobile(MobileAction::SetTheme(Theme::Dark)).kind(), "mobile/setTheme");
        assert_eq!(Action::User(UserAction::SetLoading(true)).kind(), "user/setLoading");
        assert_eq!(
            Action::Tickets(TicketsAction::SetError(None)).kind(),
            "tickets/setError"
        );
    }

    #[test]
    fn test_action_json_shape() {
        let action: Action = MobileAction::SetOnlineStatus(false).into();
        let json = serde_json::to_value(&action).unwrap();

        assert_eq!(json["slice"], "mobile");
        assert_eq!(json["action"]["type"], "setOnlineStatus");
        assert_eq!(json["action"]["payload"], false);

        let parsed: Action = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, action);
    }
}
