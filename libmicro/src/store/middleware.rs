//! Middleware chain
//!
//! Every dispatched action flows through the store's middleware in
//! declaration order before reaching the reducers. A middleware receives
//! the action by value and decides whether, and with what, to continue the
//! chain by calling [`Next::run`]. Work done after `run` returns observes
//! the already-reduced state.

use std::sync::Arc;

use tracing::{debug, trace};

use super::action::Action;
use super::Store;

pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    fn handle(&self, store: &Store, action: Action, next: Next<'_>);
}

/// The remainder of the chain after the current middleware
pub struct Next<'a> {
    store: &'a Store,
    rest: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(store: &'a Store, chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self { store, rest: chain }
    }

    /// Pass `action` on; the last link applies it to the reducers
    pub fn run(self, action: Action) {
        match self.rest.split_first() {
            Some((middleware, rest)) => {
                middleware.handle(self.store, action, Next { store: self.store, rest })
            }
            None => self.store.apply(action),
        }
    }
}

/// Action logger
///
/// Composers append it after every feature middleware, so it only ever
/// sees fully applied actions. Emits one `debug` event per action, plus the
/// previous and next state at `trace`.
pub struct LoggerMiddleware {
    label: String,
}

impl LoggerMiddleware {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Middleware for LoggerMiddleware {
    fn name(&self) -> &str {
        "logger"
    }

    fn handle(&self, store: &Store, action: Action, next: Next<'_>) {
        let kind = action.kind();
        let detail = tracing::enabled!(tracing::Level::TRACE)
            .then(|| (format!("{:?}", action), store.with_state(|s| format!("{:?}", s))));

        next.run(action);

        debug!(store = %self.label, action = kind, version = store.version(), "Action applied");
        if let Some((action, previous)) = detail {
            let current = store.with_state(|s| format!("{:?}", s));
            trace!(
                store = %self.label,
                action = %action,
                previous = %previous,
                next = %current,
                "State transition"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_app::mobile::{MobileAction, MobileSlice, MobileState, Theme};
    use crate::store::ReducerMap;
    use std::sync::Mutex;

    /// Records the theme it saw before and after the rest of the chain
    struct ThemeRecorder {
        seen: Arc<Mutex<Vec<(String, Theme, Theme)>>>,
        label: &'static str,
    }

    impl Middleware for ThemeRecorder {
        fn name(&self) -> &str {
            self.label
        }

        fn handle(&self, store: &Store, action: Action, next: Next<'_>) {
            let theme = |s: &Store| {
                s.select(|tree| {
                    tree.get::<MobileState>("mobile")
                        .map(|m| m.theme)
                        .unwrap_or_default()
                })
            };
            let before = theme(store);
            next.run(action);
            let after = theme(store);
            self.seen.lock().unwrap().push((self.label.to_string(), before, after));
        }
    }

    /// Drops every action
    struct Swallow;

    impl Middleware for Swallow {
        fn name(&self) -> &str {
            "swallow"
        }

        fn handle(&self, _store: &Store, _action: Action, _next: Next<'_>) {}
    }

    fn store_with(middleware: Vec<Arc<dyn Middleware>>) -> Store {
        Store::from_parts(
            "test",
            ReducerMap::new().with_slice("mobile", MobileSlice),
            middleware,
            Default::default(),
            8,
        )
    }

    #[test]
    fn test_middleware_runs_in_declared_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = store_with(vec![
            Arc::new(ThemeRecorder { seen: Arc::clone(&seen), label: "first" }),
            Arc::new(ThemeRecorder { seen: Arc::clone(&seen), label: "second" }),
            Arc::new(LoggerMiddleware::new("test")),
        ]);

        store.dispatch(MobileAction::SetTheme(Theme::Dark).into());

        let seen = seen.lock().unwrap();
        // Inner link finishes first
        assert_eq!(seen[0], ("second".to_string(), Theme::Light, Theme::Dark));
        assert_eq!(seen[1], ("first".to_string(), Theme::Light, Theme::Dark));
    }

    #[test]
    fn test_middleware_can_stop_the_chain() {
        let store = store_with(vec![Arc::new(Swallow)]);

        store.dispatch(MobileAction::SetTheme(Theme::Dark).into());

        let theme = store.select(|tree| tree.get::<MobileState>("mobile").unwrap().theme);
        assert_eq!(theme, Theme::Light);
        assert_eq!(store.version(), 0);
    }
}
