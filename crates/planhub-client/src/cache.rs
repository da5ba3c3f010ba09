//! Client-side reconciliation cache.
//!
//! Holds the last-known view of the signed-in user's notification feed and
//! keeps it consistent with the server under optimistic local mutations,
//! realtime pushes and rate-limited refetches.
//!
//! The cache is shared between the UI and the realtime listener, so every
//! operation takes `&self`. State lives behind a synchronous mutex that is
//! never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use planhub_core::config::ClientConfig;
use planhub_core::error::AppError;
use planhub_core::result::AppResult;
use planhub_core::types::id::{NotificationId, UserId};
use planhub_entity::notification::Notification;

use crate::api::NotificationApi;

/// Whether a fetch is currently outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPhase {
    /// No fetch in flight.
    #[default]
    Idle,
    /// A fetch has been issued and not yet completed.
    Fetching,
}

/// Why a fetch request was dropped without contacting the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No user is signed in.
    NoUser,
    /// Another fetch is already in flight.
    InFlight,
    /// The last successful fetch is more recent than the minimum interval.
    RateLimited,
    /// Data is loaded and the cache is configured to skip refetches.
    AlreadyLoaded,
}

/// Result of [`ReconciliationCache::fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The server was queried and local state replaced.
    Fetched,
    /// The request was dropped before reaching the server.
    Dropped(DropReason),
    /// The response arrived after the signed-in user changed and was thrown away.
    Discarded,
}

/// What [`ReconciliationCache::apply_push`] did with a pushed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDisposition {
    /// Inserted at the head of the list.
    Merged,
    /// Already present locally.
    Duplicate,
    /// A fetch was in flight; the next fetch is forced instead.
    Deferred,
    /// Addressed to a different user than the one signed in.
    Ignored,
}

/// Read-only copy of the cache state.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    /// Signed-in user.
    pub user: Option<UserId>,
    /// Local list; pushes are inserted at the head.
    pub items: Vec<Notification>,
    /// Last known unread count.
    pub unread_count: u64,
    /// Last known total count.
    pub total_count: u64,
    /// Fetch phase.
    pub phase: FetchPhase,
    /// Whether the next fetch bypasses rate limiting.
    pub force_refresh: bool,
    /// Whether at least one fetch has succeeded for this user.
    pub loaded: bool,
    /// Message of the most recent failed request.
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct CacheState {
    user: Option<UserId>,
    /// Bumped whenever the signed-in user changes; in-flight fetches from an
    /// older session are discarded.
    session: u64,
    items: Vec<Notification>,
    unread_count: u64,
    total_count: u64,
    phase: FetchPhase,
    last_fetch: Option<Instant>,
    force_refresh: bool,
    loaded: bool,
    last_error: Option<String>,
}

/// Client-resident cache of one user's notifications.
#[derive(Debug)]
pub struct ReconciliationCache {
    api: Arc<dyn NotificationApi>,
    min_refresh_interval: Duration,
    skip_when_loaded: bool,
    page_size: u64,
    state: Mutex<CacheState>,
}

/// Resets the phase if a fetch future is dropped before completing.
struct InFlight<'a> {
    cache: &'a ReconciliationCache,
    session: u64,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.cache.lock();
        if state.session == self.session && state.phase == FetchPhase::Fetching {
            state.phase = FetchPhase::Idle;
            debug!("Cancelled fetch released the in-flight guard");
        }
    }
}

impl ReconciliationCache {
    /// Creates an empty cache with no user signed in.
    pub fn new(api: Arc<dyn NotificationApi>, config: &ClientConfig) -> Self {
        Self {
            api,
            min_refresh_interval: Duration::from_secs(config.min_refresh_interval_seconds),
            skip_when_loaded: config.skip_when_loaded,
            page_size: config.page_size.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sign a user in. Switching to a different user empties the cache.
    pub fn set_user(&self, user_id: UserId) {
        let mut state = self.lock();
        if state.user == Some(user_id) {
            return;
        }
        let session = state.session + 1;
        *state = CacheState {
            user: Some(user_id),
            session,
            ..CacheState::default()
        };
        info!(user_id = %user_id, "Notification cache bound to user");
    }

    /// Sign out and drop all cached data.
    pub fn clear(&self) {
        let mut state = self.lock();
        let session = state.session + 1;
        *state = CacheState {
            session,
            ..CacheState::default()
        };
        debug!("Notification cache cleared");
    }

    /// Fetch the first page from the server and replace local state.
    ///
    /// Dropped without a request when no user is signed in, a fetch is
    /// already in flight, or the previous success is too recent. A forced
    /// refresh skips the recency checks. On failure local state is left
    /// untouched and the error is recorded; nothing is retried.
    pub async fn fetch(&self) -> AppResult<FetchOutcome> {
        let (session, forced) = match self.begin_fetch() {
            Ok(started) => started,
            Err(reason) => {
                debug!(reason = ?reason, "Notification fetch dropped");
                return Ok(FetchOutcome::Dropped(reason));
            }
        };

        let mut guard = InFlight {
            cache: self,
            session,
            finished: false,
        };
        let result = self.api.fetch_page(1, self.page_size).await;
        guard.finished = true;

        let mut state = self.lock();
        if state.session != session {
            debug!("Discarding fetch result for a previous user");
            return Ok(FetchOutcome::Discarded);
        }
        state.phase = FetchPhase::Idle;

        match result {
            Ok(page) => {
                state.items = page.items;
                state.unread_count = page.unread_count;
                state.total_count = page.total_count;
                state.last_fetch = Some(Instant::now());
                state.loaded = true;
                state.last_error = None;
                debug!(
                    items = state.items.len(),
                    unread = state.unread_count,
                    total = state.total_count,
                    "Notification cache refreshed"
                );
                Ok(FetchOutcome::Fetched)
            }
            Err(e) => {
                warn!(error = %e, "Notification fetch failed");
                state.force_refresh |= forced;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Apply the drop rules and enter `Fetching`. Returns the session and
    /// whether this fetch consumed a pending force flag.
    fn begin_fetch(&self) -> Result<(u64, bool), DropReason> {
        let mut state = self.lock();
        if state.user.is_none() {
            return Err(DropReason::NoUser);
        }
        if state.phase == FetchPhase::Fetching {
            return Err(DropReason::InFlight);
        }
        if !state.force_refresh {
            if self.skip_when_loaded && state.loaded {
                return Err(DropReason::AlreadyLoaded);
            }
            if let Some(last) = state.last_fetch {
                if last.elapsed() < self.min_refresh_interval {
                    return Err(DropReason::RateLimited);
                }
            }
        }

        let forced = std::mem::take(&mut state.force_refresh);
        state.phase = FetchPhase::Fetching;
        Ok((state.session, forced))
    }

    /// Force the next fetch past rate limiting and run it now.
    pub async fn request_refresh(&self) -> AppResult<FetchOutcome> {
        self.lock().force_refresh = true;
        self.fetch().await
    }

    /// Merge a realtime push.
    ///
    /// While a fetch is in flight the push is not merged; instead the next
    /// fetch is forced so the server's copy is picked up.
    pub fn apply_push(&self, notification: Notification) -> PushDisposition {
        let mut state = self.lock();
        if state.user != Some(notification.user_id) {
            return PushDisposition::Ignored;
        }
        if state.phase == FetchPhase::Fetching {
            state.force_refresh = true;
            debug!(notification_id = %notification.id, "Push deferred to next fetch");
            return PushDisposition::Deferred;
        }
        if state.items.iter().any(|n| n.id == notification.id) {
            return PushDisposition::Duplicate;
        }

        if notification.is_unread() {
            state.unread_count += 1;
        }
        state.total_count += 1;
        debug!(notification_id = %notification.id, "Push merged into cache");
        state.items.insert(0, notification);
        PushDisposition::Merged
    }

    /// Optimistically mark one notification read, then tell the server.
    ///
    /// A failed request is recorded but not rolled back; the next successful
    /// fetch restores server truth.
    pub async fn mark_as_read(&self, id: NotificationId) -> AppResult<()> {
        {
            let mut guard = self.lock();
            if guard.user.is_none() {
                return Err(AppError::authentication("No user signed in"));
            }
            let state = &mut *guard;
            if let Some(item) = state.items.iter_mut().find(|n| n.id == id) {
                if item.mark_read(Utc::now()) {
                    state.unread_count = state.unread_count.saturating_sub(1);
                }
            }
        }

        self.api.mark_read(id).await.map_err(|e| {
            warn!(notification_id = %id, error = %e, "Mark-read request failed");
            self.lock().last_error = Some(e.to_string());
            e
        })
    }

    /// Optimistically mark every cached notification read, then tell the server.
    pub async fn mark_all_as_read(&self) -> AppResult<u64> {
        {
            let mut guard = self.lock();
            if guard.user.is_none() {
                return Err(AppError::authentication("No user signed in"));
            }
            let now = Utc::now();
            for item in guard.items.iter_mut() {
                item.mark_read(now);
            }
            guard.unread_count = 0;
        }

        self.api.mark_all_read().await.map_err(|e| {
            warn!(error = %e, "Mark-all-read request failed");
            self.lock().last_error = Some(e.to_string());
            e
        })
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.lock();
        CacheSnapshot {
            user: state.user,
            items: state.items.clone(),
            unread_count: state.unread_count,
            total_count: state.total_count,
            phase: state.phase,
            force_refresh: state.force_refresh,
            loaded: state.loaded,
            last_error: state.last_error.clone(),
        }
    }

    /// Current unread count.
    pub fn unread_count(&self) -> u64 {
        self.lock().unread_count
    }

    /// Current fetch phase.
    pub fn phase(&self) -> FetchPhase {
        self.lock().phase
    }

    /// Message of the most recent failed request.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }
}
