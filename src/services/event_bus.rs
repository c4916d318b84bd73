//! Typed channel carrying host lifecycle events to the engine.
//!
//! Hosts hold a cloneable [`EventBus`] and publish into it; the engine owns the single
//! [`EventStream`] and drains it in delivery order.

use tokio::sync::mpsc;

use crate::host::HostEvent;

/// Publishing half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<HostEvent>,
}

/// Receiving half, owned by the engine.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<HostEvent>,
}

impl EventBus {
    pub fn channel() -> (EventBus, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventBus { tx }, EventStream { rx })
    }

    /// Publishes an event. Returns false once the engine has stopped listening.
    pub fn publish(&self, event: HostEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

impl EventStream {
    /// Waits for the next event; `None` once every publisher is gone.
    pub async fn next(&mut self) -> Option<HostEvent> {
        self.rx.recv().await
    }
}
