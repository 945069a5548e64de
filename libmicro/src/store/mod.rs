//! Store module
//!
//! Contains the reducer-store architecture shared by every micro host:
//! - Actions: what can happen
//! - Slices: named state partitions and their pure reducers
//! - Middleware: ordered interceptors around the reducers
//! - Store: the single writer that owns the state tree
//!
//! A store is an explicitly constructed handle. Clones share the same
//! state; there is no process-wide instance.
//!
//! # Single writer
//!
//! `dispatch` is the only path that mutates state. Dispatches are
//! serialized, and each one runs the full middleware chain and every
//! reducer before the next begins. An action dispatched from inside the
//! chain (for example by a middleware) is queued and applied right after
//! the current one.

pub mod action;
pub mod events;
pub mod middleware;
pub mod slice;
pub mod state;
pub mod subscription;

pub use action::Action;
pub use events::{EventBus, EventReceiver, StoreEvent};
pub use middleware::{LoggerMiddleware, Middleware, Next};
pub use slice::{ReducerMap, Slice, SliceState};
pub use state::StateTree;
pub use subscription::Watch;

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::ThreadId;

use tokio::sync::watch;

use crate::cache::{ApiClient, ApiRuntime};

#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    name: String,
    reducers: ReducerMap,
    middleware: Vec<Arc<dyn Middleware>>,
    apis: BTreeMap<String, Arc<ApiRuntime>>,
    state: RwLock<StateTree>,
    writer: Mutex<()>,
    active_writer: Mutex<Option<ThreadId>>,
    pending: Mutex<VecDeque<Action>>,
    version: watch::Sender<u64>,
    events: EventBus,
}

/// Non-owning store reference for timers, watches and accessors
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the calling thread as the active writer for the guard's lifetime
struct ActiveWriter<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl<'a> ActiveWriter<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>, thread: ThreadId) -> Self {
        *lock(slot) = Some(thread);
        Self { slot }
    }
}

impl Drop for ActiveWriter<'_> {
    fn drop(&mut self) {
        *lock(self.slot) = None;
    }
}

impl Store {
    /// Assemble a store from already validated parts
    ///
    /// Hosts go through the composers, which check the parts first.
    pub(crate) fn from_parts(
        name: impl Into<String>,
        reducers: ReducerMap,
        middleware: Vec<Arc<dyn Middleware>>,
        apis: BTreeMap<String, Arc<ApiRuntime>>,
        event_capacity: usize,
    ) -> Self {
        let state = StateTree::initial(&reducers);
        let (version, _) = watch::channel(0);

        Self {
            inner: Arc::new(StoreInner {
                name: name.into(),
                reducers,
                middleware,
                apis,
                state: RwLock::new(state),
                writer: Mutex::new(()),
                active_writer: Mutex::new(None),
                pending: Mutex::new(VecDeque::new()),
                version,
                events: EventBus::new(event_capacity),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Run `action` through the middleware chain and the reducers
    pub fn dispatch(&self, action: Action) {
        let thread = std::thread::current().id();

        let reentrant = *lock(&self.inner.active_writer) == Some(thread);
        if reentrant {
            lock(&self.inner.pending).push_back(action);
            return;
        }

        let _writer = lock(&self.inner.writer);
        let _active = ActiveWriter::enter(&self.inner.active_writer, thread);

        self.run_chain(action);
        loop {
            let queued = lock(&self.inner.pending).pop_front();
            match queued {
                Some(action) => self.run_chain(action),
                None => break,
            }
        }
    }

    fn run_chain(&self, action: Action) {
        Next::new(self, &self.inner.middleware).run(action);
    }

    /// Terminal link of the chain: every reducer sees the action
    pub(crate) fn apply(&self, action: Action) {
        {
            let mut tree = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            let slices = self.inner.reducers.entries().iter().zip(tree.slices_mut());
            for ((key, slice), state) in slices {
                if !slice.apply(state, &action) {
                    tracing::error!(
                        store = %self.inner.name,
                        slice = %key,
                        "Slice holds an unexpected state type"
                    );
                }
            }
        }

        let mut version = 0;
        self.inner.version.send_modify(|v| {
            *v += 1;
            version = *v;
        });

        self.inner.events.emit(StoreEvent::ActionApplied {
            store: self.inner.name.clone(),
            action: action.kind().to_string(),
            version,
        });
    }

    /// Borrow the state tree for the duration of `f`
    pub fn with_state<R>(&self, f: impl FnOnce(&StateTree) -> R) -> R {
        let tree = self.inner.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&tree)
    }

    /// Current value of a derived selector
    pub fn select<T>(&self, selector: impl Fn(&StateTree) -> T) -> T {
        self.with_state(|tree| selector(tree))
    }

    /// Subscribe to a selector; see [`Watch`]
    pub fn watch<T, F>(&self, selector: F) -> Watch<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&StateTree) -> T + Send + Sync + 'static,
    {
        let receiver = self.inner.version.subscribe();
        let initial = self.with_state(|tree| selector(tree));
        Watch::new(self.downgrade(), receiver, Box::new(selector), initial)
    }

    /// Owned copy of the whole state tree
    pub fn snapshot(&self) -> StateTree {
        self.with_state(StateTree::clone)
    }

    /// Number of actions applied so far
    pub fn version(&self) -> u64 {
        *self.inner.version.borrow()
    }

    pub fn slice_keys(&self) -> Vec<String> {
        self.inner.reducers.keys().map(str::to_string).collect()
    }

    pub fn middleware_names(&self) -> Vec<String> {
        self.inner.middleware.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn subscribe_events(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Cache client hooks for the API mounted at `reducer_path`
    pub fn api(&self, reducer_path: &str) -> Option<ApiClient> {
        self.inner
            .apis
            .get(reducer_path)
            .map(|runtime| ApiClient::new(Arc::clone(runtime), self.clone()))
    }

    pub fn api_paths(&self) -> Vec<String> {
        self.inner.apis.keys().cloned().collect()
    }

    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// True if both handles refer to the same store
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("slices", &self.inner.reducers)
            .field("version", &self.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_app::mobile::{MobileAction, MobileSlice, MobileState, Theme};
    use crate::main_app::user::{UserAction, UserSlice, UserState};

    /// Dispatches a follow-up action from inside the chain
    struct Echo;

    impl Middleware for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn handle(&self, store: &Store, action: Action, next: Next<'_>) {
            let follow_up = matches!(action, Action::Mobile(MobileAction::SetTheme(Theme::Dark)));
            next.run(action);
            if follow_up {
                store.dispatch(MobileAction::SetOnlineStatus(false).into());
                // The queued action has not been applied yet
                let online = store.select(|t| t.get::<MobileState>("mobile").unwrap().is_online);
                assert!(online);
            }
        }
    }

    fn store(middleware: Vec<Arc<dyn Middleware>>) -> Store {
        Store::from_parts(
            "root",
            ReducerMap::new()
                .with_slice("mobile", MobileSlice)
                .with_slice("user", UserSlice),
            middleware,
            BTreeMap::new(),
            8,
        )
    }

    #[test]
    fn test_dispatch_reaches_every_slice_reducer() {
        let store = store(Vec::new());

        store.dispatch(MobileAction::SetTheme(Theme::Dark).into());
        store.dispatch(UserAction::SetLoading(true).into());

        let (theme, loading) = store.select(|tree| {
            (
                tree.get::<MobileState>("mobile").unwrap().theme,
                tree.get::<UserState>("user").unwrap().loading,
            )
        });
        assert_eq!(theme, Theme::Dark);
        assert!(loading);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_reentrant_dispatch_is_queued() {
        let store = store(vec![Arc::new(Echo)]);

        store.dispatch(MobileAction::SetTheme(Theme::Dark).into());

        let mobile = store.select(|t| t.get::<MobileState>("mobile").unwrap().clone());
        assert_eq!(mobile.theme, Theme::Dark);
        assert!(!mobile.is_online);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = store(Vec::new());
        let before = store.snapshot();

        store.dispatch(MobileAction::SetTheme(Theme::Dark).into());

        assert_eq!(before.get::<MobileState>("mobile").unwrap().theme, Theme::Light);
        assert_eq!(store.snapshot().get::<MobileState>("mobile").unwrap().theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_action_applied_events() {
        let store = store(Vec::new());
        let mut events = store.subscribe_events();

        store.dispatch(UserAction::SetError(Some("boom".to_string())).into());

        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::ActionApplied {
                store: "root".to_string(),
                action: "user/setError".to_string(),
                version: 1,
            }
        );
    }

    #[test]
    fn test_dispatch_from_many_threads_is_serialized() {
        let store = store(Vec::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let theme = if i % 2 == 0 { Theme::Dark } else { Theme::Light };
                        store.dispatch(MobileAction::SetTheme(theme).into());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.version(), 100);
    }
}
