//! Listener abstraction: one open delivery channel bound to one connection

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::SendError;
use crate::event::HubEvent;

/// Unique handle of a listener, used to unregister it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery endpoint invoked by the dispatcher.
///
/// `send` must not block: it either hands the event off or fails fast. A
/// failure is treated exactly like a disconnect and the listener is removed.
pub trait Listener: Send + Sync {
    fn id(&self) -> ListenerId;

    /// Hand off one event.
    ///
    /// Runs while the hub holds its delivery lock. A send that blocks stalls
    /// every publish and subscribe that has a listener to reach until it
    /// returns; publishes with no listener to reach are unaffected.
    fn send(&self, event: Arc<HubEvent>) -> Result<(), SendError>;

    /// Stop accepting events. Idempotent.
    fn close(&self);
}

/// Listener backed by an unbounded channel drained by a connection task.
///
/// The receiving half ends once the listener is closed or dropped, which is
/// how the transport learns the hub let go of the connection.
pub struct ChannelListener {
    id: ListenerId,
    tx: Mutex<Option<mpsc::UnboundedSender<Arc<HubEvent>>>>,
}

impl ChannelListener {
    /// Create a listener and the receiver its connection task reads from
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Arc<HubEvent>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Arc::new(Self {
            id: ListenerId::new(),
            tx: Mutex::new(Some(tx)),
        });
        (listener, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_none_or(|tx| tx.is_closed())
    }
}

impl Listener for ChannelListener {
    fn id(&self) -> ListenerId {
        self.id
    }

    fn send(&self, event: Arc<HubEvent>) -> Result<(), SendError> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => tx.send(event).map_err(|_| SendError::Disconnected),
            None => Err(SendError::Closed),
        }
    }

    fn close(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl fmt::Debug for ChannelListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelListener")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventId;

    fn event(id: u64) -> Arc<HubEvent> {
        Arc::new(HubEvent {
            id: EventId::new(id),
            name: "message-created".to_string(),
            payload: None,
        })
    }

    #[test]
    fn listener_ids_are_unique() {
        assert_ne!(ListenerId::new(), ListenerId::new());
    }

    #[tokio::test]
    async fn send_reaches_receiver() {
        let (listener, mut rx) = ChannelListener::new();
        listener.send(event(1)).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, EventId::new(1));
    }

    #[test]
    fn send_fails_after_receiver_dropped() {
        let (listener, rx) = ChannelListener::new();
        drop(rx);

        assert_eq!(listener.send(event(1)), Err(SendError::Disconnected));
        assert!(listener.is_closed());
    }

    #[tokio::test]
    async fn close_ends_receiver_and_rejects_sends() {
        let (listener, mut rx) = ChannelListener::new();
        listener.send(event(1)).unwrap();
        listener.close();
        listener.close();

        assert_eq!(listener.send(event(2)), Err(SendError::Closed));
        assert_eq!(rx.recv().await.unwrap().id, EventId::new(1));
        assert!(rx.recv().await.is_none());
    }
}
