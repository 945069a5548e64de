//! Feature store modules
//!
//! A module is what a feature hands to a host: its reducer map, its
//! middleware and its cache clients. Hosts never look inside; they pass
//! modules to a composer.

use std::sync::Arc;

use crate::bridge::{DetachedAccessor, MainAppAccessor};
use crate::cache::{ApiDefinition, ApiMiddleware, ApiRuntime, Transport};
use crate::config::Config;
use crate::error::Result;
use crate::store::{Middleware, ReducerMap, Slice};

pub struct FeatureModule {
    name: String,
    reducers: ReducerMap,
    middleware: Vec<Arc<dyn Middleware>>,
    apis: Vec<Arc<ApiRuntime>>,
}

impl FeatureModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reducers: ReducerMap::new(),
            middleware: Vec::new(),
            apis: Vec::new(),
        }
    }

    pub fn slice<S: Slice>(mut self, key: impl Into<String>, slice: S) -> Self {
        self.reducers.insert(key, slice);
        self
    }

    /// Mount a cache client: its slice at the reducer path, plus its
    /// middleware
    pub fn api(mut self, runtime: Arc<ApiRuntime>) -> Self {
        self.reducers.insert(runtime.reducer_path().to_string(), runtime.slice());
        self.middleware.push(Arc::new(ApiMiddleware::new(Arc::clone(&runtime))));
        self.apis.push(runtime);
        self
    }

    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reducers(&self) -> &ReducerMap {
        &self.reducers
    }

    pub(crate) fn middleware_chain(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    pub(crate) fn apis(&self) -> &[Arc<ApiRuntime>] {
        &self.apis
    }
}

impl std::fmt::Debug for FeatureModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureModule")
            .field("name", &self.name)
            .field("reducers", &self.reducers)
            .field("middleware", &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// What a module needs from its host to build itself
#[derive(Clone)]
pub struct ModuleContext {
    config: Config,
    transport: Arc<dyn Transport>,
    accessor: Arc<dyn MainAppAccessor>,
}

impl ModuleContext {
    /// Context with a detached main app accessor
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: config.clone(),
            transport,
            accessor: Arc::new(DetachedAccessor),
        }
    }

    pub fn with_accessor(mut self, accessor: Arc<dyn MainAppAccessor>) -> Self {
        self.accessor = accessor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn accessor(&self) -> Arc<dyn MainAppAccessor> {
        Arc::clone(&self.accessor)
    }

    /// Runtime for `definition` using the host's transport and timing
    pub fn runtime(&self, definition: ApiDefinition) -> Result<Arc<ApiRuntime>> {
        Ok(Arc::new(ApiRuntime::from_config(
            definition,
            Arc::clone(&self.transport),
            &self.config.api,
        )?))
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext").field("config", &self.config).finish()
    }
}
