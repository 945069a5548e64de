//! Transactions, payment methods and payment settings

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Action, Slice, StateTree};

pub const TRANSACTIONS_KEY: &str = "transactions";
pub const PAYMENT_METHODS_KEY: &str = "paymentMethods";
pub const PAYMENT_SETTINGS_KEY: &str = "paymentSettings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodType {
    Card,
    Bank,
    Wallet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    #[serde(default)]
    pub details: serde_json::Map<String, Value>,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettings {
    pub currency: String,
    pub auto_pay_enabled: bool,
    pub payment_threshold: f64,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            auto_pay_enabled: false,
            payment_threshold: 0.0,
        }
    }
}

/// Partial settings update; absent fields keep their value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_pay_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_threshold: Option<f64>,
}

impl PaymentSettings {
    fn merge(self, patch: &PaymentSettingsPatch) -> Self {
        Self {
            currency: patch.currency.clone().unwrap_or(self.currency),
            auto_pay_enabled: patch.auto_pay_enabled.unwrap_or(self.auto_pay_enabled),
            payment_threshold: patch.payment_threshold.unwrap_or(self.payment_threshold),
        }
    }
}

// === Transactions ===

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsState {
    pub transactions: Vec<Transaction>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum TransactionsAction {
    SetLoading(bool),
    SetError(Option<String>),
    SetTransactions(Vec<Transaction>),
}

impl TransactionsAction {
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionsAction::SetLoading(_) => "transactions/setLoading",
            TransactionsAction::SetError(_) => "transactions/setError",
            TransactionsAction::SetTransactions(_) => "transactions/setTransactions",
        }
    }
}

pub struct TransactionsSlice;

impl Slice for TransactionsSlice {
    type State = TransactionsState;

    fn reduce(&self, state: TransactionsState, action: &Action) -> TransactionsState {
        let Action::Transactions(action) = action else {
            return state;
        };

        match action {
            TransactionsAction::SetLoading(loading) => TransactionsState {
                loading: *loading,
                ..state
            },
            TransactionsAction::SetError(error) => TransactionsState {
                error: error.clone(),
                ..state
            },
            TransactionsAction::SetTransactions(transactions) => TransactionsState {
                transactions: transactions.clone(),
                ..state
            },
        }
    }
}

// === Payment methods ===

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsState {
    pub methods: Vec<PaymentMethod>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum PaymentMethodsAction {
    SetLoading(bool),
    SetError(Option<String>),
    SetPaymentMethods(Vec<PaymentMethod>),
}

impl PaymentMethodsAction {
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentMethodsAction::SetLoading(_) => "paymentMethods/setLoading",
            PaymentMethodsAction::SetError(_) => "paymentMethods/setError",
            PaymentMethodsAction::SetPaymentMethods(_) => "paymentMethods/setPaymentMethods",
        }
    }
}

pub struct PaymentMethodsSlice;

impl Slice for PaymentMethodsSlice {
    type State = PaymentMethodsState;

    fn reduce(&self, state: PaymentMethodsState, action: &Action) -> PaymentMethodsState {
        let Action::PaymentMethods(action) = action else {
            return state;
        };

        match action {
            PaymentMethodsAction::SetLoading(loading) => PaymentMethodsState {
                loading: *loading,
                ..state
            },
            PaymentMethodsAction::SetError(error) => PaymentMethodsState {
                error: error.clone(),
                ..state
            },
            PaymentMethodsAction::SetPaymentMethods(methods) => PaymentMethodsState {
                methods: methods.clone(),
                ..state
            },
        }
    }
}

// === Settings ===

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettingsState {
    pub settings: PaymentSettings,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum PaymentSettingsAction {
    SetLoading(bool),
    SetError(Option<String>),
    UpdateSettings(PaymentSettingsPatch),
}

impl PaymentSettingsAction {
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentSettingsAction::SetLoading(_) => "paymentSettings/setLoading",
            PaymentSettingsAction::SetError(_) => "paymentSettings/setError",
            PaymentSettingsAction::UpdateSettings(_) => "paymentSettings/updateSettings",
        }
    }
}

pub struct PaymentSettingsSlice;

impl Slice for PaymentSettingsSlice {
    type State = PaymentSettingsState;

    fn reduce(&self, state: PaymentSettingsState, action: &Action) -> PaymentSettingsState {
        let Action::PaymentSettings(action) = action else {
            return state;
        };

        match action {
            PaymentSettingsAction::SetLoading(loading) => PaymentSettingsState {
                loading: *loading,
                ..state
            },
            PaymentSettingsAction::SetError(error) => PaymentSettingsState {
                error: error.clone(),
                ..state
            },
            PaymentSettingsAction::UpdateSettings(patch) => PaymentSettingsState {
                settings: state.settings.merge(patch),
                ..state
            },
        }
    }
}

// === Action creators ===

pub fn set_transactions(transactions: Vec<Transaction>) -> Action {
    TransactionsAction::SetTransactions(transactions).into()
}

pub fn set_transactions_loading(loading: bool) -> Action {
    TransactionsAction::SetLoading(loading).into()
}

pub fn set_transactions_error(error: Option<String>) -> Action {
    TransactionsAction::SetError(error).into()
}

pub fn set_payment_methods(methods: Vec<PaymentMethod>) -> Action {
    PaymentMethodsAction::SetPaymentMethods(methods).into()
}

pub fn set_payment_methods_loading(loading: bool) -> Action {
    PaymentMethodsAction::SetLoading(loading).into()
}

pub fn set_payment_methods_error(error: Option<String>) -> Action {
    PaymentMethodsAction::SetError(error).into()
}

pub fn update_settings(patch: PaymentSettingsPatch) -> Action {
    PaymentSettingsAction::UpdateSettings(patch).into()
}

pub fn set_settings_loading(loading: bool) -> Action {
    PaymentSettingsAction::SetLoading(loading).into()
}

pub fn set_settings_error(error: Option<String>) -> Action {
    PaymentSettingsAction::SetError(error).into()
}

// === Selectors ===

pub fn select_transactions(tree: &StateTree) -> Vec<Transaction> {
    tree.get::<TransactionsState>(TRANSACTIONS_KEY)
        .map(|s| s.transactions.clone())
        .unwrap_or_default()
}

pub fn select_payment_methods(tree: &StateTree) -> Vec<PaymentMethod> {
    tree.get::<PaymentMethodsState>(PAYMENT_METHODS_KEY)
        .map(|s| s.methods.clone())
        .unwrap_or_default()
}

/// The default payment method, if one is marked
pub fn select_default_payment_method(tree: &StateTree) -> Option<PaymentMethod> {
    tree.get::<PaymentMethodsState>(PAYMENT_METHODS_KEY)
        .and_then(|s| s.methods.iter().find(|m| m.is_default).cloned())
}

pub fn select_settings(tree: &StateTree) -> PaymentSettings {
    tree.get::<PaymentSettingsState>(PAYMENT_SETTINGS_KEY)
        .map(|s| s.settings.clone())
        .unwrap_or_default()
}
