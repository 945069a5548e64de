//! Host assemblies
//!
//! The two ways the feature modules are put together: the main app with
//! every module under one root store, and the support app running its
//! module alone.

use std::sync::Arc;

use tracing::info;

use crate::bridge::{DetachedAccessor, MainAppAccessor, RootAccessor};
use crate::cache::Transport;
use crate::composer::{RootComposer, StandaloneComposer};
use crate::config::Config;
use crate::error::Result;
use crate::features::{payments, support};
use crate::main_app;
use crate::module::ModuleContext;
use crate::store::Store;

/// A composed store plus the accessor its modules were given
#[derive(Clone)]
pub struct Host {
    pub store: Store,
    pub accessor: Arc<dyn MainAppAccessor>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").field("store", &self.store).finish()
    }
}

/// Root store: main app slices, then payments, then support
///
/// Every module is built with a [`RootAccessor`] that is mounted on the
/// store once it exists, so feature code can read the signed-in user.
///
/// # Errors
///
/// Returns an error if the API timing in `config` does not parse or the
/// modules fail to compose.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use libmicro::{compose_main_app, Config, MockTransport};
///
/// let host = compose_main_app(&Config::default(), Arc::new(MockTransport::new())).unwrap();
/// assert_eq!(host.store.api_paths(), vec!["mainApi", "paymentsApi", "supportApi"]);
/// assert!(host.accessor.main_user().is_none());
/// ```
pub fn compose_main_app(config: &Config, transport: Arc<dyn Transport>) -> Result<Host> {
    let accessor = RootAccessor::new();
    let ctx = ModuleContext::new(config, transport).with_accessor(accessor.clone());

    let store = RootComposer::new(&config.store)
        .module(main_app::module(&ctx)?)
        .module(payments::module(&ctx)?)
        .module(support::module(&ctx)?)
        .mount_accessor(Arc::clone(&accessor))
        .build()?;

    info!(slices = ?store.slice_keys(), "Main app store ready");
    Ok(Host { store, accessor })
}

/// Standalone support store with a detached accessor
pub fn compose_support_app(config: &Config, transport: Arc<dyn Transport>) -> Result<Host> {
    let accessor: Arc<dyn MainAppAccessor> = Arc::new(DetachedAccessor);
    let ctx = ModuleContext::new(config, transport).with_accessor(Arc::clone(&accessor));

    let store = StandaloneComposer::new(support::module(&ctx)?, &config.store).build()?;

    info!(slices = ?store.slice_keys(), "Support app store ready");
    Ok(Host { store, accessor })
}
