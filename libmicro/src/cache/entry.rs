//! Cache entries and the per-API cache state
//!
//! `ApiState` is the slice a cache client owns inside its host store. It
//! is only changed by [`super::slice::reduce`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tag::Tag;

/// Fingerprint of a request: endpoint name plus canonical JSON arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// `serde_json` maps are sorted, so equal arguments always render the
    /// same string
    pub fn new(endpoint: &str, args: &Value) -> Self {
        CacheKey(format!("{}({})", endpoint, args))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Uninitialized,
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub endpoint: String,
    pub args: Value,
    pub status: RequestStatus,
    /// Last successful payload, kept across later failures
    pub data: Option<Value>,
    pub error: Option<String>,
    /// Tags provided by the last successful fetch
    pub provided: Vec<Tag>,
    /// Logical clock at the start of the most recent fetch
    pub started_at: u64,
    /// Logical clock at the start of the fetch that produced `data`
    pub fetched_at: Option<u64>,
    /// Wall-clock fulfilment time, unix millis
    pub fulfilled_at: Option<i64>,
    pub subscribers: usize,
    /// Logical clock when the subscriber count last dropped to zero
    pub unsubscribed_at: Option<u64>,
}

impl CacheEntry {
    pub(crate) fn new(endpoint: &str, args: Value) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            args,
            status: RequestStatus::Uninitialized,
            data: None,
            error: None,
            provided: Vec::new(),
            started_at: 0,
            fetched_at: None,
            fulfilled_at: None,
            subscribers: 0,
            unsubscribed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationEntry {
    pub endpoint: String,
    pub args: Value,
    pub status: RequestStatus,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub started_at: i64,
    /// Start order within this API
    pub seq: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiState {
    pub queries: BTreeMap<CacheKey, CacheEntry>,
    pub mutations: BTreeMap<String, MutationEntry>,
    /// Logical clock of the latest invalidation per tag
    pub invalidated: BTreeMap<String, u64>,
    /// Logical clock; advances on every fetch start, invalidation and
    /// release of an entry
    pub clock: u64,
    /// Number of mutations started so far
    #[serde(default)]
    pub mutation_seq: u64,
}

impl ApiState {
    pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.queries.get(key)
    }

    /// Latest invalidation affecting `tag`, counting bare invalidations of
    /// its kind
    pub fn invalidated_at(&self, tag: &Tag) -> u64 {
        let exact = self.invalidated.get(&tag.to_string()).copied().unwrap_or(0);
        if tag.is_bare() {
            return exact;
        }
        let bare = self.invalidated.get(&tag.kind).copied().unwrap_or(0);
        exact.max(bare)
    }

    /// An entry is stale iff one of its tags was invalidated after the
    /// fetch that produced its data started
    pub fn is_stale(&self, entry: &CacheEntry) -> bool {
        match entry.fetched_at {
            Some(fetched_at) => entry
                .provided
                .iter()
                .any(|tag| self.invalidated_at(tag) > fetched_at),
            None => false,
        }
    }

    /// Whether the next read of `key` must go to the network
    pub fn needs_fetch(&self, key: &CacheKey) -> bool {
        match self.queries.get(key) {
            None => true,
            Some(entry) => match entry.status {
                RequestStatus::Uninitialized | RequestStatus::Rejected => true,
                RequestStatus::Pending => false,
                RequestStatus::Fulfilled => self.is_stale(entry),
            },
        }
    }

    /// Stale entries that somebody is subscribed to and that are not
    /// already being fetched
    pub fn stale_subscribed(&self) -> Vec<(CacheKey, CacheEntry)> {
        self.queries
            .iter()
            .filter(|(_, entry)| {
                entry.subscribers > 0
                    && entry.status != RequestStatus::Pending
                    && self.is_stale(entry)
            })
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Whether `key` was fulfilled for a subscriber and invalidated while
    /// that fetch was running
    pub fn invalidated_during_fetch(&self, key: &CacheKey) -> bool {
        self.queries.get(key).is_some_and(|entry| {
            entry.subscribers > 0
                && entry.status == RequestStatus::Fulfilled
                && self.is_stale(entry)
        })
    }
}
