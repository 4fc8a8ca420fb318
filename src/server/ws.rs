use crate::state::{AppState, PerfCounters, WsMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut notices = state.ws_tx.subscribe();
    let mut views = state.session.subscribe();

    // Send initial view
    {
        let initial = WsMessage::ViewUpdate {
            view: views.borrow_and_update().clone(),
        };
        if let Ok(json) = serde_json::to_string(&initial) {
            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
            PerfCounters::bump(&state.counters.ws_messages_sent);
        }
    }

    // Forward view changes and notices to this client
    let send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                changed = views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    WsMessage::ViewUpdate { view }
                }
                notice = notices.recv() => match notice {
                    Ok(msg) => msg,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "ws client lagging, notices dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                    PerfCounters::bump(&state.counters.ws_messages_sent);
                }
                Err(_) => continue,
            }
        }
    });

    // Read (and discard) incoming messages; detect disconnect
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {} // Ignore client messages
            }
        }
    });

    // Wait for either task to finish (client disconnected)
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }
}
