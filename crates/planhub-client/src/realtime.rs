//! Realtime listener: keeps a WebSocket open and feeds pushes into the cache.

use std::sync::Arc;

use futures::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;
use planhub_core::types::id::UserId;

use crate::cache::ReconciliationCache;
use crate::event::ServerEvent;

/// Frames this client sends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame<'a> {
    Authenticate {
        user_id: UserId,
        #[serde(skip_serializing_if = "Option::is_none")]
        token: Option<&'a str>,
    },
    Pong {
        timestamp: i64,
    },
}

/// Connects to the realtime endpoint as one user.
#[derive(Debug, Clone)]
pub struct RealtimeListener {
    url: String,
    user_id: UserId,
    token: Option<String>,
    cache: Arc<ReconciliationCache>,
}

impl RealtimeListener {
    /// Creates a listener for `url` (e.g. `ws://localhost:8080/ws`).
    pub fn new(
        url: impl Into<String>,
        user_id: UserId,
        token: Option<String>,
        cache: Arc<ReconciliationCache>,
    ) -> Self {
        Self {
            url: url.into(),
            user_id,
            token,
            cache,
        }
    }

    /// Run until the server closes the connection or `shutdown` fires.
    ///
    /// A rejected handshake ends the run with an authentication error.
    /// Reconnecting is left to the caller.
    pub async fn run(&self, shutdown: CancellationToken) -> AppResult<()> {
        let (ws, _response) = connect_async(self.url.as_str()).await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, "WebSocket connect failed", e)
        })?;
        let (mut writer, mut reader) = ws.split();
        debug!(url = %self.url, "Realtime connection established");

        send_frame(
            &mut writer,
            &ClientFrame::Authenticate {
                user_id: self.user_id,
                token: self.token.as_deref(),
            },
        )
        .await?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    let _ = writer.send(Message::Close(None)).await;
                    break;
                }
                frame = reader.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(timestamp) = self.on_event(text.as_str()).await? {
                            send_frame(&mut writer, &ClientFrame::Pong { timestamp }).await?;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(AppError::with_source(
                            ErrorKind::Transport,
                            "WebSocket read failed",
                            e,
                        ));
                    }
                },
            }
        }

        info!(user_id = %self.user_id, "Realtime connection closed");
        Ok(())
    }

    /// Handle one text frame. Returns a timestamp to pong back, if any.
    async fn on_event(&self, raw: &str) -> AppResult<Option<i64>> {
        let event = match serde_json::from_str::<ServerEvent>(raw) {
            Ok(ev) => ev,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed realtime frame");
                return Ok(None);
            }
        };

        match event {
            ServerEvent::AuthSuccess { user_id } => {
                info!(user_id = %user_id, "Realtime handshake accepted");
                // Catch up on anything created while disconnected.
                if let Err(e) = self.cache.fetch().await {
                    warn!(error = %e, "Catch-up fetch failed");
                }
            }
            ServerEvent::AuthError { message } => {
                return Err(AppError::authentication(message));
            }
            ServerEvent::Notification(notification) => {
                let disposition = self.cache.apply_push(notification);
                debug!(disposition = ?disposition, "Realtime push applied");
            }
            ServerEvent::Ping { timestamp } => return Ok(Some(timestamp)),
            ServerEvent::Broadcast { title, severity, .. } => {
                info!(title = %title, severity = %severity, "System broadcast received");
            }
            ServerEvent::Error { code, message } => {
                warn!(code = %code, message = %message, "Server reported a protocol error");
            }
            ServerEvent::Pong { .. } | ServerEvent::Other => {}
        }
        Ok(None)
    }
}

async fn send_frame<S>(sink: &mut S, frame: &ClientFrame<'_>) -> AppResult<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let payload = serde_json::to_string(frame).map_err(|e| {
        AppError::with_source(ErrorKind::Serialization, "Failed to encode frame", e)
    })?;
    sink.send(Message::text(payload))
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Transport, "WebSocket send failed", e))
}
