//! Subscriber registry: recipient -> currently open listeners

use std::sync::Arc;

use dashmap::DashMap;

use crate::event::{RecipientId, Recipients};
use crate::listener::{Listener, ListenerId};

/// A listener resolved for delivery, paired with the recipient it belongs to
pub type Target = (RecipientId, Arc<dyn Listener>);

/// Concurrent map from recipient to listeners.
///
/// Sharded locking keeps registration for unrelated recipients independent.
/// A recipient whose last listener is removed disappears from the map.
#[derive(Default)]
pub struct SubscriberRegistry {
    listeners: DashMap<RecipientId, Vec<Arc<dyn Listener>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener for `recipient`, creating its entry if needed
    pub fn register(&self, recipient: RecipientId, listener: Arc<dyn Listener>) {
        self.listeners.entry(recipient).or_default().push(listener);
    }

    /// Remove a listener. Returns whether it was present; removing an
    /// unknown or already removed listener is a no-op.
    pub fn unregister(&self, recipient: &RecipientId, listener: ListenerId) -> bool {
        let mut removed = false;
        self.listeners.remove_if_mut(recipient, |_, list| {
            let before = list.len();
            list.retain(|l| l.id() != listener);
            removed = list.len() < before;
            list.is_empty()
        });
        removed
    }

    /// Snapshot of the listeners an event with `recipients` should reach
    pub fn listeners_for(&self, recipients: &Recipients) -> Vec<Target> {
        match recipients {
            Recipients::All => self
                .listeners
                .iter()
                .flat_map(|entry| {
                    let recipient = entry.key().clone();
                    entry
                        .value()
                        .iter()
                        .map(|l| (recipient.clone(), Arc::clone(l)))
                        .collect::<Vec<_>>()
                })
                .collect(),
            Recipients::Only(ids) => ids
                .iter()
                .filter_map(|id| self.listeners.get(id))
                .flat_map(|entry| {
                    let recipient = entry.key().clone();
                    entry
                        .value()
                        .iter()
                        .map(|l| (recipient.clone(), Arc::clone(l)))
                        .collect::<Vec<_>>()
                })
                .collect(),
        }
    }

    /// Whether an event with `recipients` would reach any listener
    pub fn has_listeners_for(&self, recipients: &Recipients) -> bool {
        match recipients {
            Recipients::All => !self.listeners.is_empty(),
            Recipients::Only(ids) => ids.iter().any(|id| self.listeners.contains_key(id)),
        }
    }

    /// Total number of open listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of recipients with at least one listener
    pub fn recipient_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_registered(&self, recipient: &RecipientId) -> bool {
        self.listeners.contains_key(recipient)
    }
}
