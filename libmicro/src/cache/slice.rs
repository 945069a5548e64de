//! Reducer for the cache state of one API

use super::action::ApiAction;
use super::entry::{ApiState, CacheEntry, CacheKey, MutationEntry, RequestStatus};
use crate::store::{Action, Slice};

/// Settled mutations kept per API for inspection
pub const SETTLED_MUTATIONS_KEPT: usize = 20;

/// The slice a cache client mounts at its reducer path
pub struct ApiSlice {
    reducer_path: String,
}

impl ApiSlice {
    pub fn new(reducer_path: impl Into<String>) -> Self {
        Self {
            reducer_path: reducer_path.into(),
        }
    }
}

impl Slice for ApiSlice {
    type State = ApiState;

    fn reduce(&self, state: ApiState, action: &Action) -> ApiState {
        match action {
            Action::Api(action) if action.api() == self.reducer_path => reduce(state, action),
            _ => state,
        }
    }
}

/// Pure transition function for cache state
pub fn reduce(mut state: ApiState, action: &ApiAction) -> ApiState {
    match action {
        ApiAction::QueryStarted { key, endpoint, args, .. } => {
            state.clock += 1;
            let clock = state.clock;
            let entry = state
                .queries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(endpoint, args.clone()));
            entry.status = RequestStatus::Pending;
            entry.started_at = clock;
        }

        ApiAction::QueryFulfilled { key, data, tags, fulfilled_at, .. } => {
            if let Some(entry) = state.queries.get_mut(key) {
                entry.status = RequestStatus::Fulfilled;
                entry.data = Some(data.clone());
                entry.error = None;
                entry.provided = tags.clone();
                entry.fetched_at = Some(entry.started_at);
                entry.fulfilled_at = Some(*fulfilled_at);
            }
            release_if_unwatched(&mut state, key);
        }

        ApiAction::QueryRejected { key, error, .. } => {
            if let Some(entry) = state.queries.get_mut(key) {
                entry.status = RequestStatus::Rejected;
                entry.error = Some(error.clone());
            }
            release_if_unwatched(&mut state, key);
        }

        ApiAction::MutationStarted { request_id, endpoint, args, started_at, .. } => {
            state.mutation_seq += 1;
            let seq = state.mutation_seq;
            state.mutations.insert(
                request_id.clone(),
                MutationEntry {
                    endpoint: endpoint.clone(),
                    args: args.clone(),
                    status: RequestStatus::Pending,
                    data: None,
                    error: None,
                    started_at: *started_at,
                    seq,
                },
            );
        }

        ApiAction::MutationFulfilled { request_id, data, .. } => {
            if let Some(entry) = state.mutations.get_mut(request_id) {
                entry.status = RequestStatus::Fulfilled;
                entry.data = Some(data.clone());
            }
            prune_settled_mutations(&mut state);
        }

        ApiAction::MutationRejected { request_id, error, .. } => {
            if let Some(entry) = state.mutations.get_mut(request_id) {
                entry.status = RequestStatus::Rejected;
                entry.error = Some(error.clone());
            }
            prune_settled_mutations(&mut state);
        }

        ApiAction::TagsInvalidated { tags, .. } => {
            if !tags.is_empty() {
                state.clock += 1;
                let clock = state.clock;
                for tag in tags {
                    state.invalidated.insert(tag.to_string(), clock);
                }
            }
        }

        ApiAction::Subscribed { key, endpoint, args, .. } => {
            let entry = state
                .queries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(endpoint, args.clone()));
            entry.subscribers += 1;
            entry.unsubscribed_at = None;
        }

        ApiAction::Unsubscribed { key, .. } => {
            if let Some(entry) = state.queries.get_mut(key) {
                entry.subscribers = entry.subscribers.saturating_sub(1);
                if entry.subscribers == 0 {
                    // Fresh stamp per release so older eviction timers miss
                    state.clock += 1;
                    entry.unsubscribed_at = Some(state.clock);
                }
            }
        }

        ApiAction::EntryExpired { key, unsubscribed_at, .. } => {
            let expired = state.queries.get(key).is_some_and(|entry| {
                entry.subscribers == 0
                    && entry.unsubscribed_at == Some(*unsubscribed_at)
                    && entry.status != RequestStatus::Pending
            });
            if expired {
                state.queries.remove(key);
            }
        }
    }

    state
}

/// Stamp an entry that settled with nobody subscribed, so it expires like
/// a released one
fn release_if_unwatched(state: &mut ApiState, key: &CacheKey) {
    if let Some(entry) = state.queries.get_mut(key) {
        if entry.subscribers == 0 {
            state.clock += 1;
            entry.unsubscribed_at = Some(state.clock);
        }
    }
}

/// Drop the oldest settled mutations beyond [`SETTLED_MUTATIONS_KEPT`]
fn prune_settled_mutations(state: &mut ApiState) {
    let mut settled: Vec<(u64, String)> = state
        .mutations
        .iter()
        .filter(|(_, entry)| entry.status != RequestStatus::Pending)
        .map(|(id, entry)| (entry.seq, id.clone()))
        .collect();
    if settled.len() <= SETTLED_MUTATIONS_KEPT {
        return;
    }

    settled.sort_unstable();
    let excess = settled.len() - SETTLED_MUTATIONS_KEPT;
    for (_, id) in settled.into_iter().take(excess) {
        state.mutations.remove(&id);
    }
}
