//! REST API endpoint handlers for the Observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Live occupancy dashboard |
//! | `GET` | `/health` | Liveness and subscriber count |
//! | `POST` | `/api/update-parking` | Sensor occupancy update |
//! | `GET` | `/api/parking-data` | Current presented view |
//! | `GET` | `/api/parking-history` | Recent history records |

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::Utc;
use parkwatch_types::{HistoryPeriod, HistoryRecord, OccupancyUpdate, PresentedView};

use crate::error::ObserverError;
use crate::state::AppState;

/// Records returned by the history endpoint when `limit` is absent.
pub const DEFAULT_HISTORY_LIMIT: usize = 24;

/// Upper bound on `limit` for the history endpoint.
pub const MAX_HISTORY_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/parking-history`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of records (default 24, clamped to 1..=1000).
    pub limit: Option<usize>,
    /// Look-back window: `hour` (default), `day`, `week` or `month`.
    pub period: Option<String>,
}

/// Body of a successful `POST /api/update-parking`.
#[derive(Debug, serde::Serialize)]
struct UpdateResponse {
    success: bool,
    message: &'static str,
    data: PresentedView,
}

/// Body of `GET /api/parking-history`.
#[derive(Debug, serde::Serialize)]
struct HistoryResponse {
    success: bool,
    count: usize,
    period: HistoryPeriod,
    data: Vec<HistoryRecord>,
}

// ---------------------------------------------------------------------------
// POST /api/update-parking
// ---------------------------------------------------------------------------

/// Accept a sensor update `{total, occupied}`.
///
/// Responds with the fresh presented view on success, or a 400 with the
/// validation reason. Malformed JSON is also a 400 with the same
/// envelope.
pub async fn update_parking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ObserverError> {
    let update = decode_update(&headers, &body)?;
    let view = state.service.apply_update(&update)?;

    Ok(Json(UpdateResponse {
        success: true,
        message: "Parking data updated successfully",
        data: view,
    }))
}

/// Decode an update body.
///
/// A body that is empty or not labelled as JSON carries no fields, so it
/// reads as an empty update and fails validation as missing fields.
fn decode_update(headers: &HeaderMap, body: &[u8]) -> Result<OccupancyUpdate, ObserverError> {
    if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(OccupancyUpdate::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ObserverError::BadRequest(format!("invalid JSON body: {e}")))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
}

// ---------------------------------------------------------------------------
// GET /api/parking-data
// ---------------------------------------------------------------------------

/// Return the current presented view, computed at request time.
pub async fn get_parking_data(State(state): State<Arc<AppState>>) -> Json<PresentedView> {
    Json(state.service.current_view())
}

// ---------------------------------------------------------------------------
// GET /api/parking-history
// ---------------------------------------------------------------------------

/// Return up to `limit` history records inside `period`, newest first.
///
/// Unknown periods fall back to `hour`.
pub async fn get_parking_history(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ObserverError> {
    let Query(params) = query.map_err(|e| ObserverError::BadRequest(e.body_text()))?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let period = HistoryPeriod::from_query(params.period.as_deref());
    let since = period.since(Utc::now());

    let records = state.history.recent(since, limit).await?;

    Ok(Json(HistoryResponse {
        success: true,
        count: records.len(),
        period,
        data: records,
    }))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness check with the live subscriber count.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "subscribers": state.service.subscriber_count(),
        "history": state.history.backend(),
    }))
}

// ---------------------------------------------------------------------------
// GET / -- live dashboard
// ---------------------------------------------------------------------------

/// Serve the live dashboard.
///
/// The page renders the current view server-side, then keeps itself
/// current over `/ws/parking`, falling back to polling
/// `/api/parking-data` every 30 seconds while the socket is down.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.service.current_view();
    let status = view.status;
    let available = view.available;
    let occupied = view.occupied;
    let total = view.total;
    let rate = &view.occupancy_rate;
    let ago = &view.updated_ago;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Parkwatch</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        .Available {{ color: #3fb950; }}
        .Full {{ color: #f85149; }}
        #connection.connected {{ color: #3fb950; }}
        #connection.disconnected {{ color: #f85149; }}
    </style>
</head>
<body>
    <h1>Parkwatch</h1>
    <p class="subtitle">Live parking occupancy</p>

    <p>Status: <span id="status" class="{status}">{status}</span>
       &middot; updated <span id="updated-ago">{ago}</span>
       &middot; <span id="connection" class="disconnected">Connecting</span></p>

    <div>
        <div class="metric">
            <div class="label">Available</div>
            <div class="value" id="available">{available}</div>
        </div>
        <div class="metric">
            <div class="label">Occupied</div>
            <div class="value" id="occupied">{occupied}</div>
        </div>
        <div class="metric">
            <div class="label">Total</div>
            <div class="value" id="total">{total}</div>
        </div>
        <div class="metric">
            <div class="label">Occupancy</div>
            <div class="value" id="rate">{rate}</div>
        </div>
    </div>

    <script>
        const render = (view) => {{
            const status = document.getElementById('status');
            status.textContent = view.status;
            status.className = view.status;
            document.getElementById('available').textContent = view.available;
            document.getElementById('occupied').textContent = view.occupied;
            document.getElementById('total').textContent = view.total;
            document.getElementById('rate').textContent = view.occupancyRate;
            document.getElementById('updated-ago').textContent = view.updatedAgo;
        }};
        const connection = (up, text) => {{
            const el = document.getElementById('connection');
            el.className = up ? 'connected' : 'disconnected';
            el.textContent = text;
        }};
        const poll = () => fetch('/api/parking-data')
            .then((r) => r.ok ? r.json() : Promise.reject(r.status))
            .then(render)
            .catch(() => connection(false, 'Connection Error'));

        let socket = null;
        const connect = () => {{
            const scheme = location.protocol === 'https:' ? 'wss' : 'ws';
            socket = new WebSocket(`${{scheme}}://${{location.host}}/ws/parking`);
            socket.onopen = () => connection(true, 'Connected');
            socket.onmessage = (msg) => {{
                const payload = JSON.parse(msg.data);
                if (payload.event === 'parkingUpdate') render(payload.data);
            }};
            socket.onclose = () => {{
                connection(false, 'Disconnected');
                setTimeout(connect, 5000);
            }};
        }};
        connect();
        setInterval(() => {{
            if (!socket || socket.readyState !== WebSocket.OPEN) poll();
        }}, 30000);
    </script>
</body>
</html>"#
    ))
}
