//! Selector subscriptions
//!
//! A [`Watch`] pairs a selector with the store's version channel. The UI
//! side reads `current()` for the initial render and awaits `changed()`
//! for every later distinct value.

use tokio::sync::watch;

use super::state::StateTree;
use super::WeakStore;

type Selector<T> = Box<dyn Fn(&StateTree) -> T + Send + Sync>;

pub struct Watch<T> {
    store: WeakStore,
    version: watch::Receiver<u64>,
    selector: Selector<T>,
    last: T,
}

impl<T> Watch<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub(crate) fn new(
        store: WeakStore,
        version: watch::Receiver<u64>,
        selector: Selector<T>,
        initial: T,
    ) -> Self {
        Self {
            store,
            version,
            selector,
            last: initial,
        }
    }

    /// Last value handed out by this watch
    pub fn current(&self) -> &T {
        &self.last
    }

    /// Re-run the selector against the store right now
    pub fn refresh(&mut self) -> Option<&T> {
        let store = self.store.upgrade()?;
        self.last = store.with_state(|tree| (self.selector)(tree));
        Some(&self.last)
    }

    /// Wait until the selected value differs from the last one seen
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            self.version.changed().await.ok()?;
            let store = self.store.upgrade()?;
            let value = store.with_state(|tree| (self.selector)(tree));
            if value != self.last {
                self.last = value.clone();
                return Some(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::features::support::{self, Ticket, TicketStatus, TicketsSlice};
    use crate::store::{ReducerMap, Store};
    use std::time::Duration;

    fn store() -> Store {
        Store::from_parts(
            "watch-test",
            ReducerMap::new().with_slice(support::TICKETS_KEY, TicketsSlice),
            Vec::new(),
            Default::default(),
            8,
        )
    }

    fn ticket(id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: format!("Ticket {}", id),
            description: String::new(),
            status: TicketStatus::Open,
            created_at: "2021-01-01".to_string(),
        }
    }

    #[tokio::test]
    async fn test_watch_yields_distinct_values_only() {
        let store = store();
        let mut count = store.watch(|tree| support::select_tickets(tree).len());
        assert_eq!(*count.current(), 0);

        // Loading flag changes state but not the selected value
        store.dispatch(support::set_loading(true));
        store.dispatch(support::add_ticket(ticket("1")));

        let next = tokio::time::timeout(Duration::from_secs(1), count.changed())
            .await
            .unwrap();
        assert_eq!(next, Some(1));
    }

    #[tokio::test]
    async fn test_watch_ends_when_store_dropped() {
        let store = store();
        let mut count = store.watch(|tree| support::select_tickets(tree).len());
        drop(store);

        assert_eq!(count.changed().await, None);
        assert!(count.refresh().is_none());
    }
}
