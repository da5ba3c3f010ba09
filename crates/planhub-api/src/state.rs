//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use planhub_auth::jwt::JwtDecoder;
use planhub_core::config::AppConfig;
use planhub_database::Repositories;
use planhub_realtime::{NotificationPipeline, RealtimeEngine};
use planhub_service::notification::{NotificationService, PreferenceGate};
use planhub_service::preference::PreferenceService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Repository set (PostgreSQL or in-memory)
    pub repositories: Repositories,

    // ── Auth ─────────────────────────────────────────────────
    /// Access token verifier
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Notification store
    pub notification_service: Arc<NotificationService>,
    /// Preference reads and writes
    pub preference_service: Arc<PreferenceService>,
    /// Create-then-push pipeline
    pub pipeline: Arc<NotificationPipeline>,

    // ── Realtime ─────────────────────────────────────────────
    /// WebSocket engine
    pub realtime: Arc<RealtimeEngine>,
}

impl AppState {
    /// Wire every service on top of `repositories`.
    pub fn new(config: AppConfig, repositories: Repositories) -> Self {
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

        let gate = PreferenceGate::new(Arc::clone(&repositories.users));
        let notification_service = Arc::new(NotificationService::new(
            Arc::clone(&repositories.notifications),
            gate,
            &config.notifications,
        ));
        let preference_service =
            Arc::new(PreferenceService::new(Arc::clone(&repositories.users)));

        let realtime = Arc::new(RealtimeEngine::new(
            config.realtime.clone(),
            Arc::clone(&repositories.users),
            Arc::clone(&jwt_decoder),
        ));
        let pipeline = Arc::new(NotificationPipeline::new(
            Arc::clone(&notification_service),
            Arc::clone(&realtime.dispatcher),
        ));

        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            repositories,
            jwt_decoder,
            notification_service,
            preference_service,
            pipeline,
            realtime,
        }
    }
}
