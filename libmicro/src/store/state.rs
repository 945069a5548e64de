//! The state tree held by a store
//!
//! One boxed [`SliceState`] per reducer key, kept in composition order.
//! Readers downcast to the concrete slice type with [`StateTree::get`].

use super::slice::{ReducerMap, SliceState};

pub struct StateTree {
    slices: Vec<(String, Box<dyn SliceState>)>,
}

impl StateTree {
    pub(crate) fn initial(reducers: &ReducerMap) -> Self {
        let slices = reducers
            .entries()
            .iter()
            .map(|(key, slice)| (key.clone(), slice.initial()))
            .collect();
        Self { slices }
    }

    /// Typed access to one slice; `None` if the key is absent or holds a
    /// different type
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.slices
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, state)| (**state).as_any().downcast_ref::<T>())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slices.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.iter().map(|(k, _)| k.as_str())
    }

    /// JSON object keyed by slice name
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .slices
            .iter()
            .map(|(key, state)| (key.clone(), state.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    pub(crate) fn slices_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn SliceState>> {
        self.slices.iter_mut().map(|(_, state)| state)
    }
}

impl Clone for StateTree {
    fn clone(&self) -> Self {
        Self {
            slices: self
                .slices
                .iter()
                .map(|(key, state)| (key.clone(), state.clone_state()))
                .collect(),
        }
    }
}

impl std::fmt::Debug for StateTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, state) in &self.slices {
            map.entry(key, state);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_app::mobile::{MobileSlice, MobileState, Theme};
    use crate::main_app::user::{UserSlice, UserState};

    fn tree() -> StateTree {
        let reducers = ReducerMap::new()
            .with_slice("mobile", MobileSlice)
            .with_slice("user", UserSlice);
        StateTree::initial(&reducers)
    }

    #[test]
    fn test_initial_tree_follows_reducer_order() {
        let tree = tree();
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["mobile", "user"]);
        assert_eq!(tree.get::<MobileState>("mobile").unwrap().theme, Theme::Light);
        assert!(tree.get::<UserState>("user").unwrap().user.is_none());
    }

    #[test]
    fn test_get_with_wrong_type_is_none() {
        let tree = tree();
        assert!(tree.get::<UserState>("mobile").is_none());
        assert!(tree.get::<MobileState>("payments").is_none());
    }

    #[test]
    fn test_to_json_is_keyed_by_slice() {
        let json = tree().to_json();
        assert_eq!(json["mobile"]["theme"], "light");
        assert_eq!(json["mobile"]["isOnline"], true);
        assert_eq!(json["user"]["user"], serde_json::Value::Null);
    }
}
