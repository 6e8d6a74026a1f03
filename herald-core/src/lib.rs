//! herald-core: Core library for the herald notification hub
//!
//! This crate provides the in-process pieces of a real-time notification
//! hub with replay:
//!
//! - **Hub** - [`Hub`] stamps events with a monotonic [`EventId`], stores them
//!   in a bounded replay buffer and fans them out to registered listeners
//! - **Registry** - [`SubscriberRegistry`] maps recipients to their open listeners
//! - **Replay buffer** - [`EventStore`] answers "everything after id N for recipient R"
//! - **Keep-alive** - [`KeepAlive`] emits heartbeats so idle streams stay open
//! - **Domain adapter** - [`DomainEventAdapter`] routes entity changes to recipients
//!
//! # Quick Start
//!
//! ```no_run
//! use herald_core::{ChannelListener, Hub, HubConfig, RecipientId, Recipients};
//!
//! # async fn example() -> Result<(), herald_core::HubError> {
//! let hub = Hub::new(HubConfig::default())?;
//!
//! let (listener, mut rx) = ChannelListener::new();
//! hub.subscribe(RecipientId::from("alice"), listener, None).await;
//!
//! hub.publish("message-created", None, Recipients::All).await;
//! let _event = rx.recv().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   EntityChange   ┌──────────────────────────────┐
//! │ DomainEventAdapter├────────────────►│             Hub              │
//! └──────────────────┘                  │  ┌──────────┐ ┌────────────┐ │
//! ┌──────────────────┐   heartbeat      │  │EventStore│ │ Subscriber │ │
//! │    KeepAlive     ├─────────────────►│  │ (replay) │ │  Registry  │ │
//! └──────────────────┘                  │  └──────────┘ └─────┬──────┘ │
//!                                       └─────────────────────┼────────┘
//!                                                             ▼
//!                                                      dyn Listener (SSE)
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod event;
pub mod hub;
pub mod keepalive;
pub mod listener;
pub mod registry;
pub mod stats;
pub mod store;

// Re-export key types for convenience
pub use config::HubConfig;
pub use domain::{
    ChannelDirectory, ChannelRecord, DomainEventAdapter, Entity, EntityChange, EntityKind,
    InMemoryChannelDirectory, Lifecycle,
};
pub use error::{HubError, SendError};
pub use event::{EventId, HubEvent, KEEP_ALIVE_EVENT, RecipientId, Recipients, StoredEvent};
pub use hub::Hub;
pub use keepalive::KeepAlive;
pub use listener::{ChannelListener, Listener, ListenerId};
pub use registry::SubscriberRegistry;
pub use stats::{HubStats, HubStatsSnapshot};
pub use store::EventStore;
