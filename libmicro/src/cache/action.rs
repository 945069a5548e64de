//! Actions owned by the cache clients
//!
//! Every variant names the API (`reducer_path`) it targets, so several
//! cache clients can share one store without reacting to each other.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entry::CacheKey;
use super::tag::Tag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ApiAction {
    QueryStarted {
        api: String,
        key: CacheKey,
        endpoint: String,
        args: Value,
    },
    QueryFulfilled {
        api: String,
        key: CacheKey,
        data: Value,
        tags: Vec<Tag>,
        fulfilled_at: i64,
    },
    QueryRejected {
        api: String,
        key: CacheKey,
        error: String,
    },
    MutationStarted {
        api: String,
        request_id: String,
        endpoint: String,
        args: Value,
        started_at: i64,
    },
    MutationFulfilled {
        api: String,
        request_id: String,
        data: Value,
    },
    MutationRejected {
        api: String,
        request_id: String,
        error: String,
    },
    TagsInvalidated {
        api: String,
        tags: Vec<Tag>,
    },
    Subscribed {
        api: String,
        key: CacheKey,
        endpoint: String,
        args: Value,
    },
    Unsubscribed {
        api: String,
        key: CacheKey,
    },
    /// Evict an entry that has had no subscribers since `unsubscribed_at`
    EntryExpired {
        api: String,
        key: CacheKey,
        unsubscribed_at: u64,
    },
}

impl ApiAction {
    /// Reducer path of the targeted API
    pub fn api(&self) -> &str {
        match self {
            ApiAction::QueryStarted { api, .. }
            | ApiAction::QueryFulfilled { api, .. }
            | ApiAction::QueryRejected { api, .. }
            | ApiAction::MutationStarted { api, .. }
            | ApiAction::MutationFulfilled { api, .. }
            | ApiAction::MutationRejected { api, .. }
            | ApiAction::TagsInvalidated { api, .. }
            | ApiAction::Subscribed { api, .. }
            | ApiAction::Unsubscribed { api, .. }
            | ApiAction::EntryExpired { api, .. } => api,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiAction::QueryStarted { .. } => "api/queryStarted",
            ApiAction::QueryFulfilled { .. } => "api/queryFulfilled",
            ApiAction::QueryRejected { .. } => "api/queryRejected",
            ApiAction::MutationStarted { .. } => "api/mutationStarted",
            ApiAction::MutationFulfilled { .. } => "api/mutationFulfilled",
            ApiAction::MutationRejected { .. } => "api/mutationRejected",
            ApiAction::TagsInvalidated { .. } => "api/tagsInvalidated",
            ApiAction::Subscribed { .. } => "api/subscribed",
            ApiAction::Unsubscribed { .. } => "api/unsubscribed",
            ApiAction::EntryExpired { .. } => "api/entryExpired",
        }
    }
}
