//! Cache client hooks
//!
//! An [`ApiClient`] binds an [`ApiRuntime`] to the store it is mounted in.
//! Reads go through [`ApiClient::query`], writes through
//! [`ApiClient::mutate`]. Neither returns transport failures as errors:
//! those end up in the `rejected` state of the entry, and the result types
//! here report them.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::action::ApiAction;
use super::endpoint::{EndpointDefinition, EndpointKind};
use super::entry::{ApiState, CacheEntry, CacheKey, RequestStatus};
use super::runtime::ApiRuntime;
use super::tag::Tag;
use crate::error::{MicroError, Result};
use crate::store::{StateTree, Store};

/// What a read currently sees for one cache entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub status: RequestStatus,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub is_stale: bool,
    pub fulfilled_at: Option<i64>,
}

impl QueryResult {
    fn from_entry(state: &ApiState, entry: Option<&CacheEntry>) -> Self {
        match entry {
            Some(entry) => Self {
                status: entry.status,
                data: entry.data.clone(),
                error: entry.error.clone(),
                is_stale: state.is_stale(entry),
                fulfilled_at: entry.fulfilled_at,
            },
            None => Self {
                status: RequestStatus::Uninitialized,
                data: None,
                error: None,
                is_stale: false,
                fulfilled_at: None,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RequestStatus::Fulfilled
    }

    pub fn is_error(&self) -> bool {
        self.status == RequestStatus::Rejected
    }

    /// Decode the payload into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.data
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| MicroError::InvalidInput(format!("Unexpected payload: {}", e)))
    }
}

/// Outcome of one write
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    pub request_id: String,
    pub status: RequestStatus,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl MutationResult {
    pub fn is_success(&self) -> bool {
        self.status == RequestStatus::Fulfilled
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.data
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| MicroError::InvalidInput(format!("Unexpected payload: {}", e)))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    runtime: Arc<ApiRuntime>,
    store: Store,
}

impl ApiClient {
    pub(crate) fn new(runtime: Arc<ApiRuntime>, store: Store) -> Self {
        Self { runtime, store }
    }

    pub fn reducer_path(&self) -> &str {
        self.runtime.reducer_path()
    }

    /// Resolve `name` as an endpoint of `kind` and check the call's arguments
    fn endpoint(
        &self,
        name: &str,
        kind: EndpointKind,
        args: &Value,
    ) -> Result<Arc<EndpointDefinition>> {
        let endpoint = self.runtime.definition().find(name).ok_or_else(|| {
            let api = self.reducer_path();
            MicroError::InvalidInput(format!("Unknown endpoint '{}' on {}", name, api))
        })?;
        if endpoint.kind() != kind {
            return Err(MicroError::InvalidInput(format!(
                "Endpoint '{}' is a {}, not a {}",
                name,
                endpoint.kind(),
                kind
            )));
        }
        endpoint.check_args(args).map_err(MicroError::InvalidInput)?;
        Ok(endpoint)
    }

    /// Read through the cache
    ///
    /// Joins an identical in-flight request, serves a fresh entry from
    /// cache, and otherwise goes to the network.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Name of a query endpoint of this API
    /// * `args` - Request arguments; together with the name they key the entry
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unknown endpoint, a mutation endpoint or missing
    /// required arguments. Transport failures are not errors here: they come
    /// back as a `rejected` result.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn demo(store: libmicro::Store) -> libmicro::Result<()> {
    /// use serde_json::Value;
    ///
    /// if let Some(support) = store.api("supportApi") {
    ///     let tickets = support.query("getTickets", Value::Null).await?;
    ///     println!("{:?}", tickets.data);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn query(&self, endpoint: &str, args: Value) -> Result<QueryResult> {
        self.read(endpoint, args, false).await
    }

    /// Like [`ApiClient::query`] but never served from cache
    pub async fn refetch(&self, endpoint: &str, args: Value) -> Result<QueryResult> {
        self.read(endpoint, args, true).await
    }

    async fn read(&self, name: &str, args: Value, force: bool) -> Result<QueryResult> {
        let endpoint = self.endpoint(name, EndpointKind::Query, &args)?;
        let key = CacheKey::new(endpoint.name(), &args);

        let must_fetch = force
            || self.runtime.is_in_flight(&key)
            || self.with_api_state(|state| state.needs_fetch(&key));

        if must_fetch {
            // The outcome is recorded in the store; read it back from there
            let _ = self.runtime.fetch(&self.store, endpoint, args).await;
        }

        Ok(self.result_for(&key))
    }

    /// Perform a write and wait for its outcome
    ///
    /// On success the endpoint's invalidated tags are marked stale before
    /// its completion actions run, so subscribed reads refetch.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::query`]: `InvalidInput` for misuse, while a
    /// failed exchange is a `rejected` result.
    pub async fn mutate(&self, endpoint: &str, args: Value) -> Result<MutationResult> {
        let endpoint = self.endpoint(endpoint, EndpointKind::Mutation, &args)?;
        let (request_id, outcome) = self.runtime.mutate(&self.store, endpoint, args).await;

        Ok(match outcome {
            Ok(data) => MutationResult {
                request_id,
                status: RequestStatus::Fulfilled,
                data: Some(data),
                error: None,
            },
            Err(error) => MutationResult {
                request_id,
                status: RequestStatus::Rejected,
                data: None,
                error: Some(error),
            },
        })
    }

    /// Mark every entry carrying one of `tags` as stale
    pub fn invalidate_tags<I, T>(&self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        let tags: Vec<Tag> = tags.into_iter().map(Into::into).collect();
        if tags.is_empty() {
            return;
        }
        self.store.dispatch(
            ApiAction::TagsInvalidated {
                api: self.reducer_path().to_string(),
                tags,
            }
            .into(),
        );
    }

    /// Keep an entry alive and refreshed while the returned handle lives
    ///
    /// Subscribed entries are refetched as soon as they are invalidated,
    /// including invalidations that land while their fetch is running.
    /// Once the last subscription drops, the entry is evicted after the
    /// API's `keep_unused_for`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn demo(client: libmicro::ApiClient) -> libmicro::Result<()> {
    /// let tickets = client.subscribe("getTickets", serde_json::Value::Null).await?;
    /// // ... later reads of `tickets.result()` stay fresh
    /// drop(tickets);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn subscribe(&self, endpoint: &str, args: Value) -> Result<QuerySubscription> {
        let definition = self.endpoint(endpoint, EndpointKind::Query, &args)?;
        let key = CacheKey::new(definition.name(), &args);

        self.store.dispatch(
            ApiAction::Subscribed {
                api: self.reducer_path().to_string(),
                key: key.clone(),
                endpoint: definition.name().to_string(),
                args: args.clone(),
            }
            .into(),
        );
        let subscription = QuerySubscription {
            client: self.clone(),
            key,
        };

        self.query(endpoint, args).await?;
        Ok(subscription)
    }

    pub fn entry(&self, endpoint: &str, args: &Value) -> Option<CacheEntry> {
        let key = CacheKey::new(endpoint, args);
        self.with_api_state(|state| state.entry(&key).cloned())
    }

    /// Current view of an entry without touching the network
    pub fn peek(&self, endpoint: &str, args: &Value) -> QueryResult {
        self.result_for(&CacheKey::new(endpoint, args))
    }

    pub fn is_stale(&self, endpoint: &str, args: &Value) -> bool {
        self.peek(endpoint, args).is_stale
    }

    /// Owned copy of this API's cache state
    pub fn state(&self) -> ApiState {
        self.with_api_state(ApiState::clone)
    }

    /// Number of query exchanges currently running
    pub fn in_flight(&self) -> usize {
        self.runtime.in_flight_count()
    }

    fn result_for(&self, key: &CacheKey) -> QueryResult {
        self.with_api_state(|state| QueryResult::from_entry(state, state.entry(key)))
    }

    fn with_api_state<R>(&self, f: impl FnOnce(&ApiState) -> R) -> R {
        let path = self.reducer_path();
        self.store.with_state(|tree: &StateTree| match tree.get::<ApiState>(path) {
            Some(state) => f(state),
            None => f(&ApiState::default()),
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api", &self.reducer_path())
            .field("store", &self.store.name())
            .finish()
    }
}

/// Live subscription to one cache entry; unsubscribes on drop
pub struct QuerySubscription {
    client: ApiClient,
    key: CacheKey,
}

impl QuerySubscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn result(&self) -> QueryResult {
        self.client.result_for(&self.key)
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        self.client.store.dispatch(
            ApiAction::Unsubscribed {
                api: self.client.reducer_path().to_string(),
                key: self.key.clone(),
            }
            .into(),
        );
    }
}

impl std::fmt::Debug for QuerySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("api", &self.client.reducer_path())
            .field("key", &self.key)
            .finish()
    }
}
