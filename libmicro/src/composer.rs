//! Store composers
//!
//! [`RootComposer`] merges every feature module of the main app into one
//! store; [`StandaloneComposer`] builds a store from a single module for a
//! micro app running on its own. Both share the same checks: slice keys
//! must be unique, every module must export at least one slice, and every
//! cache client must be well formed. Any failure aborts the build.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bridge::RootAccessor;
use crate::cache::ApiRuntime;
use crate::config::StoreConfig;
use crate::error::CompositionError;
use crate::module::FeatureModule;
use crate::store::{LoggerMiddleware, Middleware, ReducerMap, Store};

pub const ROOT_STORE: &str = "root";

/// Builds the main app's root store from every feature module
///
/// # Examples
///
/// ```
/// use libmicro::config::StoreConfig;
/// use libmicro::main_app::mobile::{MobileSlice, MOBILE_KEY};
/// use libmicro::{FeatureModule, RootComposer};
///
/// let store = RootComposer::new(&StoreConfig::default())
///     .module(FeatureModule::new("main").slice(MOBILE_KEY, MobileSlice))
///     .build()
///     .unwrap();
/// assert_eq!(store.slice_keys(), vec!["mobile"]);
/// ```
pub struct RootComposer {
    config: StoreConfig,
    modules: Vec<FeatureModule>,
    accessor: Option<Arc<RootAccessor>>,
}

impl RootComposer {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            config: config.clone(),
            modules: Vec::new(),
            accessor: None,
        }
    }

    /// Modules are composed in the order they are added
    pub fn module(mut self, module: FeatureModule) -> Self {
        self.modules.push(module);
        self
    }

    /// Mount `accessor` on the store once it is built
    pub fn mount_accessor(mut self, accessor: Arc<RootAccessor>) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// Compose every module into the root store
    ///
    /// # Errors
    ///
    /// Returns the first [`CompositionError`] found, checking modules in
    /// order:
    /// - A module with no slices (`MissingExport`)
    /// - A cache client with no endpoints or an undeclared tag kind
    /// - A cache client mounted twice (`DuplicateApi`)
    /// - A slice key claimed by two modules (`DuplicateSliceKey`)
    pub fn build(self) -> Result<Store, CompositionError> {
        let store = compose(ROOT_STORE, self.modules, &self.config)?;
        if let Some(accessor) = self.accessor {
            if !accessor.mount(&store) {
                debug!("Main app accessor was already mounted");
            }
        }
        Ok(store)
    }
}

pub struct StandaloneComposer {
    config: StoreConfig,
    module: FeatureModule,
}

impl StandaloneComposer {
    pub fn new(module: FeatureModule, config: &StoreConfig) -> Self {
        Self {
            config: config.clone(),
            module,
        }
    }

    /// The store is named after its module
    pub fn build(self) -> Result<Store, CompositionError> {
        let name = self.module.name().to_string();
        compose(&name, vec![self.module], &self.config)
    }
}

fn compose(
    name: &str,
    modules: Vec<FeatureModule>,
    config: &StoreConfig,
) -> Result<Store, CompositionError> {
    let mut reducers = ReducerMap::new();
    let mut owners: BTreeMap<String, String> = BTreeMap::new();
    let mut middleware: Vec<Arc<dyn Middleware>> = Vec::new();
    let mut apis: BTreeMap<String, Arc<ApiRuntime>> = BTreeMap::new();

    for module in &modules {
        if module.reducers().is_empty() {
            return Err(CompositionError::MissingExport {
                module: module.name().to_string(),
                export: "reducer".to_string(),
            });
        }

        for runtime in module.apis() {
            runtime.definition().validate()?;
            let path = runtime.reducer_path().to_string();
            if apis.contains_key(&path) {
                return Err(CompositionError::DuplicateApi(path));
            }
            apis.insert(path, Arc::clone(runtime));
        }

        for (key, slice) in module.reducers().entries() {
            if let Some(first) = owners.get(key) {
                return Err(CompositionError::DuplicateSliceKey {
                    key: key.clone(),
                    first: first.clone(),
                    second: module.name().to_string(),
                });
            }
            owners.insert(key.clone(), module.name().to_string());
            reducers.push_entry(key.clone(), Arc::clone(slice));
        }

        middleware.extend(module.middleware_chain().iter().cloned());
    }

    if config.log_actions {
        middleware.push(Arc::new(LoggerMiddleware::new(name)));
    }

    info!(
        store = name,
        slices = ?reducers.keys().collect::<Vec<_>>(),
        middleware = middleware.len(),
        "Composed store"
    );

    Ok(Store::from_parts(name, reducers, middleware, apis, config.event_capacity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_app::mobile::MobileSlice;
    use crate::main_app::user::UserSlice;

    fn config() -> StoreConfig {
        StoreConfig::default()
    }

    #[test]
    fn test_root_composition_order() {
        let store = RootComposer::new(&config())
            .module(FeatureModule::new("mobile").slice("mobile", MobileSlice))
            .module(FeatureModule::new("user").slice("user", UserSlice))
            .build()
            .unwrap();

        assert_eq!(store.name(), ROOT_STORE);
        assert_eq!(store.slice_keys(), vec!["mobile", "user"]);
        assert_eq!(store.middleware_names(), vec!["logger"]);
    }

    #[test]
    fn test_logger_can_be_disabled() {
        let config = StoreConfig {
            log_actions: false,
            ..StoreConfig::default()
        };
        let module = FeatureModule::new("mobile").slice("mobile", MobileSlice);
        let store = StandaloneComposer::new(module, &config).build().unwrap();

        assert_eq!(store.name(), "mobile");
        assert!(store.middleware_names().is_empty());
    }

    #[test]
    fn test_duplicate_slice_key() {
        let result = RootComposer::new(&config())
            .module(FeatureModule::new("app").slice("user", UserSlice))
            .module(FeatureModule::new("profile").slice("user", UserSlice))
            .build();

        assert_eq!(
            result.unwrap_err(),
            CompositionError::DuplicateSliceKey {
                key: "user".to_string(),
                first: "app".to_string(),
                second: "profile".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_module() {
        let result = RootComposer::new(&config()).module(FeatureModule::new("hollow")).build();

        assert_eq!(
            result.unwrap_err(),
            CompositionError::MissingExport {
                module: "hollow".to_string(),
                export: "reducer".to_string(),
            }
        );
    }

    #[test]
    fn test_accessor_is_mounted_after_build() {
        let accessor = RootAccessor::new();
        let _store = RootComposer::new(&config())
            .module(FeatureModule::new("user").slice("user", UserSlice))
            .mount_accessor(Arc::clone(&accessor))
            .build()
            .unwrap();

        assert!(accessor.is_mounted());
    }
}
