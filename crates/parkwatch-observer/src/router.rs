//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing enabled.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- live dashboard
/// - `GET /health` -- liveness check
/// - `GET /ws/parking` -- `WebSocket` occupancy stream
/// - `POST /api/update-parking` -- sensor update
/// - `GET /api/parking-data` -- current presented view
/// - `GET /api/parking-history` -- recent history
///
/// CORS allows any origin so sensors and dashboards on other hosts can
/// reach the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/ws/parking", get(ws::ws_parking))
        .route("/api/update-parking", post(handlers::update_parking))
        .route("/api/parking-data", get(handlers::get_parking_data))
        .route("/api/parking-history", get(handlers::get_parking_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
