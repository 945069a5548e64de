//! Support feature
//!
//! Runs inside the main app's root store or on its own in a standalone
//! store. The exported state shape is the same in both cases: a `tickets`
//! slice plus the `supportApi` cache.

pub mod api;
pub mod tickets;

pub use api::{api_definition, NewTicket, SupportApi, SUPPORT_API};
pub use tickets::*;

use crate::bridge::MainAppAccessor;
use crate::error::Result;
use crate::module::{FeatureModule, ModuleContext};

pub const MODULE_NAME: &str = "support";

pub fn module(ctx: &ModuleContext) -> Result<FeatureModule> {
    let definition = api_definition(&ctx.config().api.support_base_url, ctx.accessor());
    let runtime = ctx.runtime(definition)?;

    Ok(FeatureModule::new(MODULE_NAME)
        .slice(TICKETS_KEY, TicketsSlice)
        .api(runtime))
}

/// Greeting for the signed-in main app user; `None` when running standalone
pub fn welcome_message(accessor: &dyn MainAppAccessor) -> Option<String> {
    accessor.main_user().map(|user| format!("Welcome, {}!", user.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::DetachedAccessor;

    #[test]
    fn test_no_greeting_without_main_app() {
        assert_eq!(welcome_message(&DetachedAccessor), None);
    }
}
