//! The main app's own slices
//!
//! `mobile` and `user` belong to the host rather than to a feature; they
//! are exported as one module so the root composer treats them like any
//! other.

pub mod mobile;
pub mod user;

use crate::error::Result;
use crate::module::{FeatureModule, ModuleContext};

pub const MODULE_NAME: &str = "main";

pub fn module(ctx: &ModuleContext) -> Result<FeatureModule> {
    let runtime = ctx.runtime(user::api_definition(&ctx.config().api.main_base_url))?;

    Ok(FeatureModule::new(MODULE_NAME)
        .slice(mobile::MOBILE_KEY, mobile::MobileSlice)
        .slice(user::USER_KEY, user::UserSlice)
        .api(runtime))
}
