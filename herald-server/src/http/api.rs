//! REST API handlers

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use herald_core::{Entity, EntityChange, EventId, HubStatsSnapshot, Lifecycle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Open listeners across all recipients
    pub listeners: usize,
    /// Recipients with at least one open listener
    pub recipients: usize,
    /// Events held in the replay buffer
    pub buffered_events: usize,
    /// Most recently assigned event id
    pub last_event_id: EventId,
    pub stats: HubStatsSnapshot,
}

/// Health check endpoint
///
/// Returns server status, version, uptime, and hub counters.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let hub = &state.hub;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        listeners: hub.listener_count(),
        recipients: hub.recipient_count(),
        buffered_events: hub.buffered_events().await,
        last_event_id: hub.last_event_id().await,
        stats: hub.stats(),
    })
}

/// Response to an ingested change
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Id of the published event, `None` when the change produced no event
    pub event_id: Option<EventId>,
}

/// Ingest a domain change from the persistence layer
///
/// The change is folded into the channel directory first so membership
/// changes route to the resulting members, then routed and published. A
/// channel removal is published before it is applied so its members can
/// still be resolved.
pub async fn ingest_change(
    State(state): State<Arc<AppState>>,
    Json(change): Json<EntityChange>,
) -> (StatusCode, Json<IngestResponse>) {
    let event_id = if removes_channel(&change) {
        let event_id = state.adapter.publish(&state.hub, &change).await;
        state.directory.apply(&change).await;
        event_id
    } else {
        state.directory.apply(&change).await;
        state.adapter.publish(&state.hub, &change).await
    };

    if event_id.is_none() {
        debug!(lifecycle = ?change.lifecycle, kind = ?change.entity.kind(), "Change produced no event");
    }

    (StatusCode::ACCEPTED, Json(IngestResponse { event_id }))
}

fn removes_channel(change: &EntityChange) -> bool {
    change.lifecycle == Lifecycle::Removed && matches!(change.entity, Entity::Channel(_))
}
