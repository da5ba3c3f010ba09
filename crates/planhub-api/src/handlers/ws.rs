//! WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use planhub_realtime::connection::heartbeat::run_heartbeat;

use crate::state::AppState;

/// GET /ws. Authentication happens in-band after the upgrade.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Drives one socket until the peer leaves, the heartbeat gives up, or the
/// server shuts down.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let connections = state.realtime.connections.clone();
    let (handle, mut outbound_rx) = connections.open();
    let shutdown = handle.shutdown_token().clone();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let heartbeat = tokio::spawn(run_heartbeat(
        handle.clone(),
        connections.heartbeat_config(),
        state.realtime.metrics.clone(),
    ));

    // Outbound forwarder
    let writer_shutdown = shutdown.clone();
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = writer_shutdown.cancelled() => break,
                msg = outbound_rx.recv() => match msg {
                    Some(text) => {
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    connections.handle_inbound(&handle, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %handle.id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    // Cleanup
    connections.close(&handle);
    heartbeat.abort();
    if let Err(e) = writer.await {
        debug!(conn_id = %handle.id, error = %e, "Writer task ended abnormally");
    }
}
