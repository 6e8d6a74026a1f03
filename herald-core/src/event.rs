//! Event and identity types shared by the hub components

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::HubError;

/// Name of the payload-less heartbeat event. Never stored for replay.
pub const KEEP_ALIVE_EVENT: &str = "keep-alive";

/// Monotonic event identifier, assigned once per published event.
///
/// Serialized as a decimal string, which is also its wire form in the
/// `id:` field of a stream frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventId(u64);

impl EventId {
    /// The id before the first assigned one. Replaying from here returns
    /// everything still buffered.
    pub const ZERO: EventId = EventId(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// The id following this one
    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(EventId)
            .map_err(|_| HubError::InvalidEventId(s.to_string()))
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque identity of a user that can receive events
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecipientId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Who an event is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipients {
    /// Every listener registered at publish time
    All,
    /// Only listeners of these recipients. The hub publishes an empty set
    /// as `All`.
    Only(BTreeSet<RecipientId>),
}

impl Recipients {
    /// Explicit recipient set
    pub fn only<I, R>(ids: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RecipientId>,
    {
        Recipients::Only(ids.into_iter().map(Into::into).collect())
    }

    /// Caller-facing form: an absent or empty set means "everyone".
    pub fn from_optional(ids: Option<BTreeSet<RecipientId>>) -> Self {
        match ids {
            Some(ids) if !ids.is_empty() => Recipients::Only(ids),
            _ => Recipients::All,
        }
    }

    /// Whether an event with these recipients is visible to `recipient`
    pub fn includes(&self, recipient: &RecipientId) -> bool {
        match self {
            Recipients::All => true,
            Recipients::Only(ids) => ids.contains(recipient),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Recipients::All)
    }
}

/// The data triple handed to listeners: name, id and optional JSON payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    pub id: EventId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl HubEvent {
    pub fn is_keep_alive(&self) -> bool {
        self.name == KEEP_ALIVE_EVENT
    }
}

/// An event retained for replay together with its intended recipients
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub event: Arc<HubEvent>,
    pub recipients: Recipients,
}

impl StoredEvent {
    pub fn new(event: Arc<HubEvent>, recipients: Recipients) -> Self {
        Self { event, recipients }
    }

    pub fn id(&self) -> EventId {
        self.event.id
    }
}
