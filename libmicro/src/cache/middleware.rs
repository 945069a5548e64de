//! Store middleware for one cache client
//!
//! Runs the follow-up work a cache action implies once the reducers have
//! applied it: refetching subscribed entries after an invalidation and
//! scheduling eviction of entries nobody watches, whether released by
//! their last subscriber or fetched without one.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, trace};

use super::action::ApiAction;
use super::entry::{ApiState, CacheKey};
use super::runtime::ApiRuntime;
use crate::store::{Action, Middleware, Next, Store, StoreEvent};

pub struct ApiMiddleware {
    runtime: Arc<ApiRuntime>,
    name: String,
}

impl ApiMiddleware {
    pub fn new(runtime: Arc<ApiRuntime>) -> Self {
        let name = format!("{}/middleware", runtime.reducer_path());
        Self { runtime, name }
    }

    fn refetch_stale_subscribed(&self, store: &Store) {
        let stale = store.select(|tree| {
            tree.get::<ApiState>(self.runtime.reducer_path())
                .map(ApiState::stale_subscribed)
                .unwrap_or_default()
        });
        if stale.is_empty() {
            return;
        }

        if Handle::try_current().is_err() {
            debug!(
                api = self.runtime.reducer_path(),
                "No async runtime; stale entries refetch on next read"
            );
            return;
        }

        for (key, entry) in stale {
            if self.runtime.is_in_flight(&key) {
                continue;
            }
            let Some(endpoint) = self.runtime.definition().find(&entry.endpoint) else {
                continue;
            };
            debug!(
                api = self.runtime.reducer_path(),
                key = %key,
                "Refetching invalidated subscription"
            );
            // The exchange runs on its own task; nobody needs to await it
            drop(self.runtime.fetch(store, endpoint, entry.args));
        }
    }

    fn schedule_eviction(&self, store: &Store, key: &CacheKey) {
        let since = store.select(|tree| {
            tree.get::<ApiState>(self.runtime.reducer_path())
                .and_then(|state| state.entry(key))
                .filter(|entry| entry.subscribers == 0)
                .and_then(|entry| entry.unsubscribed_at)
        });
        let Some(unsubscribed_at) = since else {
            return;
        };

        let Ok(handle) = Handle::try_current() else {
            trace!(api = self.runtime.reducer_path(), key = %key, "No async runtime; entry kept");
            return;
        };

        let weak = store.downgrade();
        let delay = self.runtime.keep_unused_for();
        let api = self.runtime.reducer_path().to_string();
        let key = key.clone();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(store) = weak.upgrade() {
                store.dispatch(
                    ApiAction::EntryExpired {
                        api,
                        key,
                        unsubscribed_at,
                    }
                    .into(),
                );
            }
        });
    }
}

impl Middleware for ApiMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, store: &Store, action: Action, next: Next<'_>) {
        let follow_up = match &action {
            Action::Api(api_action) if api_action.api() == self.runtime.reducer_path() => {
                match api_action {
                    ApiAction::TagsInvalidated { .. }
                    | ApiAction::Unsubscribed { .. }
                    | ApiAction::QueryFulfilled { .. }
                    | ApiAction::QueryRejected { .. } => Some(api_action.clone()),
                    _ => None,
                }
            }
            _ => None,
        };

        next.run(action);

        match follow_up {
            Some(ApiAction::TagsInvalidated { api, tags }) => {
                store.events().emit(StoreEvent::TagsInvalidated {
                    api,
                    tags: tags.iter().map(ToString::to_string).collect(),
                });
                self.refetch_stale_subscribed(store);
            }
            Some(
                ApiAction::Unsubscribed { key, .. }
                | ApiAction::QueryFulfilled { key, .. }
                | ApiAction::QueryRejected { key, .. },
            ) => self.schedule_eviction(store, &key),
            _ => {}
        }
    }
}
