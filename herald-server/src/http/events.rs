//! Server-sent event stream of hub events
//!
//! Each connection registers a [`ChannelListener`] with the hub, receives the
//! replay for its last seen id, then live events until one of:
//!
//! - the connection timeout elapses (`TimedOut`)
//! - the hub closes the listener or the server shuts down (`Completed`)
//! - the client goes away (`Errored`)
//!
//! Every ending unregisters the listener exactly once.

use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::sse::{Event, Sse},
};
use futures::{Stream, stream};
use herald_core::{ChannelListener, EventId, Hub, HubEvent, Listener, ListenerId, RecipientId};
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::middleware::Recipient;

/// Standard SSE reconnection header
pub const LAST_EVENT_ID_HEADER: &str = "last-event-id";

/// Query parameters accepted by the stream endpoint
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Fallback for clients that cannot set headers
    #[serde(rename = "lastEventId")]
    pub last_event_id: Option<String>,
}

/// How a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    TimedOut,
    Errored,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::TimedOut => write!(f, "timed_out"),
            Outcome::Errored => write!(f, "errored"),
        }
    }
}

/// Stream hub events for the authenticated recipient
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
    Recipient(recipient): Recipient,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let last_seen = last_event_id(&headers, &query);

    let (listener, rx) = ChannelListener::new();
    let listener_id = listener.id();
    let replayed = state
        .hub
        .subscribe(recipient.clone(), listener, last_seen)
        .await;

    info!(
        recipient = %recipient,
        listener = %listener_id,
        last_seen = ?last_seen.map(|id| id.value()),
        replayed,
        "Event stream opened"
    );

    let connection = Connection {
        rx,
        deadline: Box::pin(tokio::time::sleep(state.hub.config().connection_timeout)),
        shutdown: state.shutdown.clone(),
        guard: ConnectionGuard {
            hub: Arc::clone(&state.hub),
            recipient,
            listener: listener_id,
            outcome: None,
        },
    };

    Sse::new(stream::unfold(connection, next_event))
}

/// Resolve the client's last seen id: header first, then query parameter.
///
/// A malformed value is logged and treated as absent.
pub fn last_event_id(headers: &HeaderMap, query: &EventsQuery) -> Option<EventId> {
    let raw = headers
        .get(LAST_EVENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(query.last_event_id.as_deref())?;

    raw.trim()
        .parse()
        .inspect_err(|e| warn!(error = %e, "Ignoring malformed last event id"))
        .ok()
}

/// Wire form of a hub event
pub fn to_sse_event(event: &HubEvent) -> Event {
    let sse = Event::default()
        .event(event.name.as_str())
        .id(event.id.to_string());
    match &event.payload {
        Some(payload) => sse.data(payload.to_string()),
        None => sse,
    }
}

struct Connection {
    rx: UnboundedReceiver<Arc<HubEvent>>,
    deadline: Pin<Box<Sleep>>,
    shutdown: CancellationToken,
    guard: ConnectionGuard,
}

enum Step {
    Deliver(Arc<HubEvent>),
    End(Outcome),
}

async fn next_event(mut conn: Connection) -> Option<(Result<Event, Infallible>, Connection)> {
    let step = tokio::select! {
        biased;
        _ = conn.shutdown.cancelled() => Step::End(Outcome::Completed),
        _ = &mut conn.deadline => Step::End(Outcome::TimedOut),
        event = conn.rx.recv() => match event {
            Some(event) => Step::Deliver(event),
            None => Step::End(Outcome::Completed),
        },
    };

    match step {
        Step::Deliver(event) => Some((Ok(to_sse_event(&event)), conn)),
        Step::End(outcome) => {
            conn.guard.outcome = Some(outcome);
            None
        }
    }
}

/// Unregisters the listener when the stream goes away, whatever the reason
struct ConnectionGuard {
    hub: Arc<Hub>,
    recipient: RecipientId,
    listener: ListenerId,
    outcome: Option<Outcome>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let outcome = self.outcome.unwrap_or(Outcome::Errored);
        let removed = self.hub.unsubscribe(&self.recipient, self.listener);
        match outcome {
            Outcome::Errored => debug!(
                recipient = %self.recipient,
                listener = %self.listener,
                removed,
                "Event stream dropped by client"
            ),
            _ => info!(
                recipient = %self.recipient,
                listener = %self.listener,
                outcome = %outcome,
                removed,
                "Event stream closed"
            ),
        }
    }
}
