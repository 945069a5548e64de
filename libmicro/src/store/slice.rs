//! Slices and reducer maps
//!
//! A slice is a named partition of store state plus the pure function that
//! transitions it. Feature modules export their slices through a
//! [`ReducerMap`]; the composers merge those maps into one store.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;

use super::action::Action;

/// Type-erased slice state as held by the store
pub trait SliceState: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_state(&self) -> Box<dyn SliceState>;
    fn to_json(&self) -> serde_json::Value;
}

impl<T> SliceState for T
where
    T: Any + Debug + Clone + Serialize + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_state(&self) -> Box<dyn SliceState> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A reducer over one slice of state
///
/// `reduce` must be pure: it receives the current state by value and
/// returns the next one. Actions addressed to other slices are returned
/// unchanged.
pub trait Slice: Send + Sync + 'static {
    type State: Any + Debug + Clone + Default + Serialize + Send + Sync;

    fn initial_state(&self) -> Self::State {
        Self::State::default()
    }

    fn reduce(&self, state: Self::State, action: &Action) -> Self::State;
}

/// Object-safe view of a [`Slice`] used inside the store
pub(crate) trait AnySlice: Send + Sync {
    fn initial(&self) -> Box<dyn SliceState>;

    /// Returns false if `state` is not this slice's state type.
    fn apply(&self, state: &mut Box<dyn SliceState>, action: &Action) -> bool;
}

impl<S: Slice> AnySlice for S {
    fn initial(&self) -> Box<dyn SliceState> {
        Box::new(self.initial_state())
    }

    fn apply(&self, state: &mut Box<dyn SliceState>, action: &Action) -> bool {
        match (**state).as_any_mut().downcast_mut::<S::State>() {
            Some(typed) => {
                let current = std::mem::take(typed);
                *typed = self.reduce(current, action);
                true
            }
            None => false,
        }
    }
}

/// Ordered mapping of slice key to reducer
#[derive(Clone, Default)]
pub struct ReducerMap {
    entries: Vec<(String, Arc<dyn AnySlice>)>,
}

impl ReducerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slice under `key`
    ///
    /// Keys are not checked here; duplicates are reported when the map is
    /// composed into a store.
    pub fn with_slice<S: Slice>(mut self, key: impl Into<String>, slice: S) -> Self {
        self.insert(key, slice);
        self
    }

    pub fn insert<S: Slice>(&mut self, key: impl Into<String>, slice: S) {
        self.entries.push((key.into(), Arc::new(slice)));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, Arc<dyn AnySlice>)] {
        &self.entries
    }

    pub(crate) fn push_entry(&mut self, key: String, slice: Arc<dyn AnySlice>) {
        self.entries.push((key, slice));
    }
}

impl std::fmt::Debug for ReducerMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_app::mobile::{MobileAction, MobileSlice, MobileState, Theme};

    #[test]
    fn test_reducer_map_preserves_insertion_order() {
        let map = ReducerMap::new()
            .with_slice("mobile", MobileSlice)
            .with_slice("mobileCopy", MobileSlice);

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["mobile", "mobileCopy"]);
        assert!(map.contains("mobileCopy"));
        assert!(!map.contains("user"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_erased_apply_runs_typed_reducer() {
        let slice = MobileSlice;
        let mut state = AnySlice::initial(&slice);

        let applied = slice.apply(&mut state, &Action::Mobile(MobileAction::SetTheme(Theme::Dark)));
        assert!(applied);

        let typed = (*state).as_any().downcast_ref::<MobileState>().unwrap();
        assert_eq!(typed.theme, Theme::Dark);
    }

    #[test]
    fn test_erased_apply_rejects_foreign_state() {
        let slice = MobileSlice;
        let mut state: Box<dyn SliceState> = Box::new(42u32);

        assert!(!slice.apply(&mut state, &Action::Mobile(MobileAction::SetOnlineStatus(false))));
    }
}
