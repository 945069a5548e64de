//! Micro - composable state for micro-app hosts
//!
//! This library provides the reducer store, the tag-invalidated request
//! cache and the composers that let independently developed feature
//! modules share one store, or run alone in their own.

pub mod bridge;
pub mod cache;
pub mod composer;
pub mod config;
pub mod error;
pub mod features;
pub mod hosts;
pub mod logging;
pub mod main_app;
pub mod module;
pub mod script;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use bridge::{DetachedAccessor, MainAppAccessor, MainTag, RootAccessor};
pub use cache::{ApiClient, MockTransport, QueryResult, Tag, Transport};
pub use composer::{RootComposer, StandaloneComposer};
pub use config::Config;
pub use error::{CompositionError, MicroError, Result};
pub use hosts::{compose_main_app, compose_support_app, Host};
pub use module::{FeatureModule, ModuleContext};
pub use store::{Action, Store};
