//! The hub: id sequencing, fan-out to listeners, and replay on subscribe
//!
//! Two locks cooperate to keep per-listener ordering without holding the
//! sequence lock during sends:
//!
//! ```text
//!   publish                          subscribe
//!   ───────                          ─────────
//!   lock(delivery)                   lock(delivery)
//!     lock(sequence)                   lock(sequence)
//!       next id, store append            since(last_seen) from store
//!       snapshot targets                 register listener
//!     unlock(sequence)                 unlock(sequence)
//!     send to targets                  send replay to listener
//!   unlock(delivery)                 unlock(delivery)
//! ```
//!
//! Ids are assigned while the delivery lock is held, so deliveries run in id
//! order, and there is no await between assigning an id and sending it: a
//! publish dropped while queued has not consumed an id yet. An event either
//! lands in a subscriber's replay or in its live stream, never both.
//!
//! A publish with no listener to reach only takes the sequence lock and does
//! not queue behind sends in progress.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, trace, warn};

use crate::config::HubConfig;
use crate::error::HubError;
use crate::event::{EventId, HubEvent, KEEP_ALIVE_EVENT, RecipientId, Recipients, StoredEvent};
use crate::listener::{Listener, ListenerId};
use crate::registry::SubscriberRegistry;
use crate::stats::{HubStats, HubStatsSnapshot};
use crate::store::EventStore;

/// State guarded by the sequence lock
struct Sequencer {
    last_id: EventId,
    store: EventStore,
}

/// Shared notification hub.
///
/// Owns the registry, the replay store and the id counter. Construct one per
/// process (or per test) and share it behind an `Arc`.
pub struct Hub {
    config: HubConfig,
    registry: SubscriberRegistry,
    sequence: Mutex<Sequencer>,
    delivery: Mutex<()>,
    stats: HubStats,
}

impl Hub {
    /// Create a hub after validating its configuration
    pub fn new(config: HubConfig) -> Result<Self, HubError> {
        config.validate()?;
        let store = EventStore::from_config(&config);
        Ok(Self {
            config,
            registry: SubscriberRegistry::new(),
            sequence: Mutex::new(Sequencer {
                last_id: EventId::ZERO,
                store,
            }),
            delivery: Mutex::new(()),
            stats: HubStats::default(),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Stamp, store and fan out an event. Returns the assigned id.
    ///
    /// Never fails: a listener that cannot accept the event is unregistered
    /// and closed, and delivery to the others continues. Heartbeats get an id
    /// like any other event but are not stored.
    pub async fn publish(
        &self,
        name: impl Into<String>,
        payload: Option<serde_json::Value>,
        recipients: Recipients,
    ) -> EventId {
        // An empty explicit set means everyone, same as an absent one
        let recipients = match recipients {
            Recipients::Only(ids) => Recipients::from_optional(Some(ids)),
            all => all,
        };
        let name = name.into();

        {
            let mut sequence = self.sequence.lock().await;
            if !self.registry.has_listeners_for(&recipients) {
                let event = self.stamp(&mut sequence, name, payload, recipients);
                drop(sequence);
                self.stats.record_published();
                trace!(
                    event_id = %event.id,
                    name = %event.name,
                    "Published event without listeners"
                );
                return event.id;
            }
        }

        let _delivery = self.delivery.lock().await;
        let (event, targets) = {
            let mut sequence = self.sequence.lock().await;
            // Registrations may have changed while queued for delivery
            let targets = self.registry.listeners_for(&recipients);
            let event = self.stamp(&mut sequence, name, payload, recipients);
            (event, targets)
        };

        self.stats.record_published();
        trace!(
            event_id = %event.id,
            name = %event.name,
            targets = targets.len(),
            "Publishing event"
        );

        for (recipient, listener) in targets {
            self.deliver(&recipient, listener.as_ref(), &event);
        }

        event.id
    }

    /// Register a listener, first handing it every buffered event for
    /// `recipient` newer than `last_seen`.
    ///
    /// Returns how many events were replayed. Without `last_seen` nothing is
    /// replayed.
    pub async fn subscribe(
        &self,
        recipient: RecipientId,
        listener: Arc<dyn Listener>,
        last_seen: Option<EventId>,
    ) -> usize {
        let _delivery = self.delivery.lock().await;
        let replay = {
            let sequence = self.sequence.lock().await;
            let replay: Vec<Arc<HubEvent>> = match last_seen {
                Some(last_seen) => sequence
                    .store
                    .since(last_seen, &recipient)
                    .map(|stored| Arc::clone(&stored.event))
                    .collect(),
                None => Vec::new(),
            };
            self.registry
                .register(recipient.clone(), Arc::clone(&listener));
            replay
        };

        let total = replay.len();
        for (replayed, event) in replay.into_iter().enumerate() {
            if !self.deliver(&recipient, listener.as_ref(), &event) {
                debug!(
                    recipient = %recipient,
                    listener = %listener.id(),
                    replayed,
                    "Listener dropped during replay"
                );
                return replayed;
            }
        }

        debug!(
            recipient = %recipient,
            listener = %listener.id(),
            last_seen = ?last_seen,
            replayed = total,
            "Listener subscribed"
        );
        total
    }

    /// Remove a listener. Safe to call any number of times from any
    /// disconnect path.
    pub fn unsubscribe(&self, recipient: &RecipientId, listener: ListenerId) -> bool {
        let removed = self.registry.unregister(recipient, listener);
        if removed {
            debug!(recipient = %recipient, listener = %listener, "Listener unsubscribed");
        }
        removed
    }

    /// Buffered events for `recipient` newer than `last_seen`, oldest first
    pub async fn since(&self, last_seen: EventId, recipient: &RecipientId) -> Vec<Arc<HubEvent>> {
        let sequence = self.sequence.lock().await;
        sequence
            .store
            .since(last_seen, recipient)
            .map(|stored| Arc::clone(&stored.event))
            .collect()
    }

    /// Publish the payload-less heartbeat to every listener
    pub async fn keep_alive(&self) -> EventId {
        self.publish(KEEP_ALIVE_EVENT, None, Recipients::All).await
    }

    /// Most recently assigned id, `EventId::ZERO` before the first publish
    pub async fn last_event_id(&self) -> EventId {
        self.sequence.lock().await.last_id
    }

    /// Number of events currently held for replay
    pub async fn buffered_events(&self) -> usize {
        self.sequence.lock().await.store.len()
    }

    pub fn listener_count(&self) -> usize {
        self.registry.listener_count()
    }

    pub fn recipient_count(&self) -> usize {
        self.registry.recipient_count()
    }

    pub fn stats(&self) -> HubStatsSnapshot {
        self.stats.snapshot()
    }

    /// Assign the next id and store the event unless it is a heartbeat
    fn stamp(
        &self,
        sequence: &mut Sequencer,
        name: String,
        payload: Option<serde_json::Value>,
        recipients: Recipients,
    ) -> Arc<HubEvent> {
        let id = sequence.last_id.next();
        sequence.last_id = id;

        let event = Arc::new(HubEvent { id, name, payload });
        if !event.is_keep_alive() {
            let evicted = sequence
                .store
                .append(StoredEvent::new(Arc::clone(&event), recipients));
            self.stats.record_stored(evicted);
        }
        event
    }

    /// Hand one event to one listener; on failure drop the listener.
    ///
    /// Returns whether the listener accepted the event.
    fn deliver(
        &self,
        recipient: &RecipientId,
        listener: &dyn Listener,
        event: &Arc<HubEvent>,
    ) -> bool {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| listener.send(Arc::clone(event))));
        match outcome {
            Ok(Ok(())) => {
                self.stats.record_delivered();
                true
            }
            Ok(Err(e)) => {
                warn!(
                    recipient = %recipient,
                    listener = %listener.id(),
                    event_id = %event.id,
                    error = %e,
                    "Send failed, dropping listener"
                );
                self.drop_listener(recipient, listener);
                false
            }
            Err(_) => {
                error!(
                    recipient = %recipient,
                    listener = %listener.id(),
                    event_id = %event.id,
                    "Listener panicked during send, dropping it"
                );
                self.drop_listener(recipient, listener);
                false
            }
        }
    }

    fn drop_listener(&self, recipient: &RecipientId, listener: &dyn Listener) {
        self.stats.record_send_failure();
        self.registry.unregister(recipient, listener.id());
        listener.close();
    }
}
