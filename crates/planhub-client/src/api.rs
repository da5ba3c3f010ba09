//! Notification API as seen from the client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use planhub_core::config::ClientConfig;
use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;
use planhub_core::types::id::NotificationId;
use planhub_entity::notification::Notification;

/// One page of the feed as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemotePage {
    /// Items on this page.
    pub items: Vec<Notification>,
    /// Items matching the query across all pages.
    pub total_count: u64,
    /// Unread items the user owns.
    pub unread_count: u64,
}

/// Server operations the reconciliation cache depends on.
#[async_trait]
pub trait NotificationApi: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch one page of the caller's notifications.
    async fn fetch_page(&self, page: u64, page_size: u64) -> AppResult<RemotePage>;

    /// Mark one notification read.
    async fn mark_read(&self, id: NotificationId) -> AppResult<()>;

    /// Mark all of the caller's notifications read.
    async fn mark_all_read(&self) -> AppResult<u64>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MarkAllBody {
    updated: u64,
}

/// [`NotificationApi`] over HTTP with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpNotificationApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpNotificationApi {
    /// Creates a new API client from configuration.
    pub fn new(config: &ClientConfig, token: Option<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Transport, "Failed to create HTTP client", e)
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> AppResult<T> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let response = req.send().await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, "Failed to send request", e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, "Failed to parse response", e)
        })?;
        Ok(envelope.data)
    }
}

/// Map a non-success response onto the shared error kinds.
fn status_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| format!("API error ({status}): {body}"));

    let kind = match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Authorization,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::BAD_REQUEST => ErrorKind::Validation,
        _ => ErrorKind::Transport,
    };
    AppError::new(kind, message)
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch_page(&self, page: u64, page_size: u64) -> AppResult<RemotePage> {
        let req = self.client.get(self.url(&format!(
            "/api/notifications?page={page}&limit={page_size}"
        )));
        self.send(req).await
    }

    async fn mark_read(&self, id: NotificationId) -> AppResult<()> {
        let req = self
            .client
            .put(self.url(&format!("/api/notifications/{id}/read")));
        let _: Notification = self.send(req).await?;
        Ok(())
    }

    async fn mark_all_read(&self) -> AppResult<u64> {
        let req = self.client.put(self.url("/api/notifications/read-all"));
        let body: MarkAllBody = self.send(req).await?;
        Ok(body.updated)
    }
}
