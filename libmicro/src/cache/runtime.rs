//! Exchange execution for one cache client
//!
//! [`ApiRuntime`] owns everything about an API that is not store state: its
//! definition, its transport, its timing and the table of in-flight
//! queries. Exchanges run as spawned tokio tasks so they always finish and
//! record their outcome, even when every awaiting caller has gone away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::action::ApiAction;
use super::endpoint::{ApiDefinition, EndpointDefinition};
use super::entry::{ApiState, CacheKey};
use super::slice::ApiSlice;
use super::transport::{join_url, HttpRequest, Transport};
use crate::config::ApiConfig;
use crate::error::{Result, TransportError};
use crate::store::{Store, StoreEvent};

/// A query exchange that any number of callers can await
pub(crate) type SharedExchange = Shared<BoxFuture<'static, std::result::Result<Value, String>>>;

pub struct ApiRuntime {
    definition: ApiDefinition,
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
    keep_unused_for: Duration,
    in_flight: Mutex<HashMap<CacheKey, SharedExchange>>,
}

impl ApiRuntime {
    pub fn new(
        definition: ApiDefinition,
        transport: Arc<dyn Transport>,
        request_timeout: Duration,
        keep_unused_for: Duration,
    ) -> Self {
        Self {
            definition,
            transport,
            request_timeout,
            keep_unused_for,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(
        definition: ApiDefinition,
        transport: Arc<dyn Transport>,
        config: &ApiConfig,
    ) -> Result<Self> {
        Ok(Self::new(
            definition,
            transport,
            config.request_timeout()?,
            config.keep_unused_for()?,
        ))
    }

    pub fn definition(&self) -> &ApiDefinition {
        &self.definition
    }

    pub fn reducer_path(&self) -> &str {
        self.definition.reducer_path()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn keep_unused_for(&self) -> Duration {
        self.keep_unused_for
    }

    /// The slice this API mounts at its reducer path
    pub fn slice(&self) -> ApiSlice {
        ApiSlice::new(self.reducer_path())
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<CacheKey, SharedExchange>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.in_flight().contains_key(key)
    }

    pub(crate) fn in_flight_count(&self) -> usize {
        self.in_flight().len()
    }

    /// Join the exchange for `key` if one is running, otherwise start one
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn fetch(
        self: &Arc<Self>,
        store: &Store,
        endpoint: Arc<EndpointDefinition>,
        args: Value,
    ) -> SharedExchange {
        let key = CacheKey::new(endpoint.name(), &args);
        let mut in_flight = self.in_flight();
        if let Some(existing) = in_flight.get(&key) {
            debug!(api = self.reducer_path(), key = %key, "Joining in-flight request");
            return existing.clone();
        }

        let run = Arc::clone(self).run_query(store.clone(), endpoint, args, key.clone());
        let task = tokio::spawn(run);
        let exchange = async move {
            task.await
                .unwrap_or_else(|e| Err(format!("Request task failed: {}", e)))
        }
        .boxed()
        .shared();

        in_flight.insert(key, exchange.clone());
        exchange
    }

    async fn run_query(
        self: Arc<Self>,
        store: Store,
        endpoint: Arc<EndpointDefinition>,
        args: Value,
        key: CacheKey,
    ) -> std::result::Result<Value, String> {
        let api = self.reducer_path().to_string();

        store.dispatch(
            ApiAction::QueryStarted {
                api: api.clone(),
                key: key.clone(),
                endpoint: endpoint.name().to_string(),
                args: args.clone(),
            }
            .into(),
        );
        store.events().emit(StoreEvent::RequestStarted {
            api: api.clone(),
            endpoint: endpoint.name().to_string(),
            key: key.to_string(),
        });

        let outcome = match self.exchange(&endpoint, &args).await {
            Ok(data) => {
                debug!(api = %api, key = %key, "Query fulfilled");
                store.dispatch(
                    ApiAction::QueryFulfilled {
                        api: api.clone(),
                        key: key.clone(),
                        data: data.clone(),
                        tags: endpoint.provided_tags(&args, &data),
                        fulfilled_at: chrono::Utc::now().timestamp_millis(),
                    }
                    .into(),
                );
                for action in endpoint.fulfilled_actions(&args, &data) {
                    store.dispatch(action);
                }
                store.events().emit(StoreEvent::RequestSucceeded {
                    api: api.clone(),
                    endpoint: endpoint.name().to_string(),
                    key: key.to_string(),
                });
                Ok(data)
            }
            Err(e) => {
                let error = e.to_string();
                warn!(api = %api, key = %key, error = %error, "Query failed");
                store.dispatch(
                    ApiAction::QueryRejected {
                        api: api.clone(),
                        key: key.clone(),
                        error: error.clone(),
                    }
                    .into(),
                );
                for action in endpoint.rejected_actions(&args, &error) {
                    store.dispatch(action);
                }
                store.events().emit(StoreEvent::RequestFailed {
                    api: api.clone(),
                    endpoint: endpoint.name().to_string(),
                    key: key.to_string(),
                    error: error.clone(),
                });
                Err(error)
            }
        };

        self.in_flight().remove(&key);

        // An invalidation that landed mid-fetch was skipped by the
        // middleware while this exchange was in flight
        let refetch = outcome.is_ok()
            && store.select(|tree| {
                tree.get::<ApiState>(&api)
                    .is_some_and(|state| state.invalidated_during_fetch(&key))
            });
        if refetch {
            debug!(api = %api, key = %key, "Invalidated during fetch; refetching");
            drop(self.fetch(&store, endpoint, args));
        }

        outcome
    }

    /// Run a mutation to completion
    ///
    /// Returns the request id and the payload or error message. The
    /// exchange runs on its own task; dropping the returned future does not
    /// cancel it.
    pub(crate) async fn mutate(
        self: &Arc<Self>,
        store: &Store,
        endpoint: Arc<EndpointDefinition>,
        args: Value,
    ) -> (String, std::result::Result<Value, String>) {
        let request_id = Uuid::new_v4().to_string();
        let run = Arc::clone(self).run_mutation(store.clone(), endpoint, args, request_id.clone());
        let outcome = match tokio::spawn(run).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    api = self.reducer_path(),
                    request_id = %request_id,
                    "Mutation task failed: {}", e
                );
                Err(format!("Request task failed: {}", e))
            }
        };
        (request_id, outcome)
    }

    async fn run_mutation(
        self: Arc<Self>,
        store: Store,
        endpoint: Arc<EndpointDefinition>,
        args: Value,
        request_id: String,
    ) -> std::result::Result<Value, String> {
        let api = self.reducer_path().to_string();

        store.dispatch(
            ApiAction::MutationStarted {
                api: api.clone(),
                request_id: request_id.clone(),
                endpoint: endpoint.name().to_string(),
                args: args.clone(),
                started_at: chrono::Utc::now().timestamp_millis(),
            }
            .into(),
        );
        store.events().emit(StoreEvent::RequestStarted {
            api: api.clone(),
            endpoint: endpoint.name().to_string(),
            key: request_id.clone(),
        });

        match self.exchange(&endpoint, &args).await {
            Ok(data) => {
                debug!(
                    api = %api,
                    endpoint = endpoint.name(),
                    request_id = %request_id,
                    "Mutation fulfilled"
                );
                store.dispatch(
                    ApiAction::MutationFulfilled {
                        api: api.clone(),
                        request_id: request_id.clone(),
                        data: data.clone(),
                    }
                    .into(),
                );

                let tags = endpoint.invalidated_tags(&args, &data);
                if !tags.is_empty() {
                    store.dispatch(ApiAction::TagsInvalidated { api: api.clone(), tags }.into());
                }

                for action in endpoint.fulfilled_actions(&args, &data) {
                    store.dispatch(action);
                }
                store.events().emit(StoreEvent::RequestSucceeded {
                    api,
                    endpoint: endpoint.name().to_string(),
                    key: request_id,
                });
                Ok(data)
            }
            Err(e) => {
                let error = e.to_string();
                warn!(api = %api, endpoint = endpoint.name(), error = %error, "Mutation failed");
                store.dispatch(
                    ApiAction::MutationRejected {
                        api: api.clone(),
                        request_id: request_id.clone(),
                        error: error.clone(),
                    }
                    .into(),
                );
                for action in endpoint.rejected_actions(&args, &error) {
                    store.dispatch(action);
                }
                store.events().emit(StoreEvent::RequestFailed {
                    api,
                    endpoint: endpoint.name().to_string(),
                    key: request_id,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    async fn exchange(
        &self,
        endpoint: &EndpointDefinition,
        args: &Value,
    ) -> std::result::Result<Value, TransportError> {
        let planned = endpoint.request(args);
        let url = join_url(self.definition.base_url(), &planned.path);
        let request = HttpRequest::new(planned.method, url, planned.body);
        debug!(
            api = self.reducer_path(),
            method = %request.method,
            url = %request.url,
            "Sending request"
        );

        match tokio::time::timeout(self.request_timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.request_timeout)),
        }
    }
}

impl std::fmt::Debug for ApiRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRuntime")
            .field("reducer_path", &self.reducer_path())
            .field("base_url", &self.definition.base_url())
            .field("request_timeout", &self.request_timeout)
            .field("keep_unused_for", &self.keep_unused_for)
            .finish()
    }
}
