//! Decoupled event bus for cross-component communication.
//!
//! The engine emits events via [`EventBus::emit`]; the front-end and tests
//! subscribe via [`EventBus::subscribe`]. Built on [`tokio::sync::broadcast`]
//! so multiple listeners can react independently.

use tokio::sync::broadcast;

use crate::engine::RequestState;

/// Events that flow through the system.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new source image replaced the previous one.
    ImageUploaded { mime_type: String, bytes: usize },
    /// The request state moved (carries the new state).
    StateChanged { state: RequestState },
    /// The active model was changed (carries the new model ID).
    ModelChanged { model: String },
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Returns a receiver that yields all
    /// future events (does not replay past ones).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}
