//! Declarative request cache
//!
//! Each feature owns one cache client (an "API"): a set of query and
//! mutation endpoints under a base URL, with tag-based invalidation.
//!
//! - [`endpoint`]: static API and endpoint definitions
//! - [`entry`] / [`slice`]: cache state as a store slice and its reducer
//! - [`runtime`]: exchange execution, request dedup and timeouts
//! - [`client`]: the hooks callers use (`query`, `mutate`, `subscribe`)
//! - [`middleware`]: refetch after invalidation, eviction of unused entries
//! - [`transport`] / [`mock`]: the network seam and its in-process stand-in

pub mod action;
pub mod client;
pub mod endpoint;
pub mod entry;
pub mod middleware;
pub mod mock;
pub mod runtime;
pub mod slice;
pub mod tag;
pub mod transport;

pub use action::ApiAction;
pub use client::{ApiClient, MutationResult, QueryResult, QuerySubscription};
pub use endpoint::{ApiDefinition, EndpointDefinition, EndpointKind, RequestSpec};
pub use entry::{ApiState, CacheEntry, CacheKey, MutationEntry, RequestStatus};
pub use middleware::ApiMiddleware;
pub use mock::MockTransport;
pub use runtime::ApiRuntime;
pub use slice::ApiSlice;
pub use tag::Tag;
pub use transport::{HttpRequest, Method, Transport};
