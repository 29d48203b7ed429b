//! `WebSocket` subscription channel for live occupancy updates.
//!
//! Clients connect to `GET /ws/parking`. The first frame is the current
//! presented view; after that one frame is pushed per accepted update.
//! Every frame is `{"event": "parkingUpdate", "data": <PresentedView>}`.
//!
//! A client that stops reading long enough to fill its queue is dropped by
//! the broadcaster and its socket is closed; it can reconnect to resync.
//! Sockets are also closed when the server begins shutting down.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use parkwatch_types::PresentedView;
use tracing::{debug, warn};

use crate::state::AppState;

/// Event name carried by every pushed frame.
pub const PARKING_UPDATE_EVENT: &str = "parkingUpdate";

/// Frame pushed to subscribers.
#[derive(Debug, serde::Serialize)]
struct LiveMessage<'a> {
    event: &'static str,
    data: &'a PresentedView,
}

/// Upgrade an HTTP request to a `WebSocket` subscription.
///
/// # Route
///
/// `GET /ws/parking`
pub async fn ws_parking(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Drive one subscription: forward views to the socket until either side
/// goes away, then unsubscribe.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut subscription = state.service.subscribe();
    let subscriber = subscription.id();
    debug!(%subscriber, "WebSocket client connected");

    let shutdown = state.shutdown_requested();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                debug!(%subscriber, "Server shutting down, closing socket");
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            view = subscription.recv() => {
                let Some(view) = view else {
                    debug!(%subscriber, "Subscriber dropped by broadcaster, closing socket");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let json = match serde_json::to_string(&LiveMessage {
                    event: PARKING_UPDATE_EVENT,
                    data: &view,
                }) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("Failed to serialize parking update: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(%subscriber, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%subscriber, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%subscriber, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%subscriber, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Viewers are passive; anything else they send is ignored.
                    }
                }
            }
        }
    }

    state.service.unsubscribe(&subscription);
}
