//! HTTP server module

mod api;
mod events;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::AppState;

pub use api::{HealthResponse, IngestResponse};
pub use events::{EventsQuery, LAST_EVENT_ID_HEADER, Outcome, last_event_id, to_sse_event};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/events", get(events::stream_events))
        .route("/api/changes", post(api::ingest_change))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
