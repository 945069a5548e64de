//! Store event bus
//!
//! Observers (host binaries, dev tooling, tests) can follow what a store is
//! doing without sitting in the middleware chain. Events are distributed
//! with `tokio::sync::broadcast`; emitting never blocks and events are
//! dropped when nobody is subscribed.
//!
//! # Example
//!
//! ```
//! use libmicro::store::events::{EventBus, StoreEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new(16);
//! let mut receiver = bus.subscribe();
//!
//! bus.emit(StoreEvent::TagsInvalidated {
//!     api: "supportApi".to_string(),
//!     tags: vec!["Ticket".to_string()],
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<StoreEvent>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// `capacity` is the per-subscriber buffer before lagging receivers
    /// start losing the oldest events
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: StoreEvent) {
        // Err only means there are no receivers
        let _ = self.sender.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// An action went through the middleware chain and the reducers
    ActionApplied {
        store: String,
        action: String,
        version: u64,
    },

    /// A cache client started a network exchange
    RequestStarted {
        api: String,
        endpoint: String,
        key: String,
    },

    RequestSucceeded {
        api: String,
        endpoint: String,
        key: String,
    },

    RequestFailed {
        api: String,
        endpoint: String,
        key: String,
        error: String,
    },

    TagsInvalidated { api: String, tags: Vec<String> },
}
