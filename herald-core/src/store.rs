//! Bounded replay buffer
//!
//! Events are appended in id order, so the deque is always sorted and a
//! `since` lookup is a binary search followed by a forward scan. When the
//! buffer grows past its capacity the oldest batch goes in one pass.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::HubConfig;
use crate::event::{EventId, RecipientId, StoredEvent};

/// In-memory, insertion-ordered store of recently published events.
///
/// Not a durable log: evicted events and anything from before process start
/// cannot be replayed.
pub struct EventStore {
    events: VecDeque<StoredEvent>,
    capacity: usize,
    eviction_batch: usize,
    min_retained: usize,
}

impl EventStore {
    pub fn new(capacity: usize, eviction_batch: usize, min_retained: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
            eviction_batch,
            min_retained,
        }
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(
            config.replay_capacity,
            config.eviction_batch,
            config.min_retained,
        )
    }

    /// Append an event, evicting the oldest batch if over capacity.
    ///
    /// Returns the number of events evicted by this call.
    pub fn append(&mut self, event: StoredEvent) -> usize {
        debug_assert!(
            self.newest_id().is_none_or(|newest| newest < event.id()),
            "events must be appended in id order"
        );
        self.events.push_back(event);

        if self.events.len() <= self.capacity {
            return 0;
        }

        let evictable = self.events.len().saturating_sub(self.min_retained);
        let count = self.eviction_batch.min(evictable);
        self.events.drain(..count);
        debug!(
            evicted = count,
            retained = self.events.len(),
            "Evicted oldest replay events"
        );
        count
    }

    /// Events with id greater than `last_seen` addressed to `recipient`,
    /// oldest first
    pub fn since<'a>(
        &'a self,
        last_seen: EventId,
        recipient: &'a RecipientId,
    ) -> impl Iterator<Item = &'a StoredEvent> + 'a {
        let start = self.events.partition_point(|e| e.id() <= last_seen);
        self.events
            .range(start..)
            .filter(move |e| e.recipients.includes(recipient))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn oldest_id(&self) -> Option<EventId> {
        self.events.front().map(StoredEvent::id)
    }

    pub fn newest_id(&self) -> Option<EventId> {
        self.events.back().map(StoredEvent::id)
    }
}
