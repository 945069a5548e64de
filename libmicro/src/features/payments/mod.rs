//! Payments feature
//!
//! Exports three local slices (`transactions`, `paymentMethods`,
//! `paymentSettings`) and the `paymentsApi` cache client.

pub mod api;
pub mod slices;

pub use api::{api_definition, PaymentsApi, PAYMENTS_API};
pub use slices::*;

use crate::error::Result;
use crate::module::{FeatureModule, ModuleContext};

pub const MODULE_NAME: &str = "payments";

pub fn module(ctx: &ModuleContext) -> Result<FeatureModule> {
    let runtime = ctx.runtime(api_definition(&ctx.config().api.payments_base_url))?;

    Ok(FeatureModule::new(MODULE_NAME)
        .slice(TRANSACTIONS_KEY, TransactionsSlice)
        .slice(PAYMENT_METHODS_KEY, PaymentMethodsSlice)
        .slice(PAYMENT_SETTINGS_KEY, PaymentSettingsSlice)
        .api(runtime))
}
