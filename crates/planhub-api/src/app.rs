//! Application builder: wires router, middleware and state into an Axum app.

use std::future::IntoFuture;
use std::time::Duration;

use axum::Router;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use planhub_core::config::{AppConfig, CorsConfig};
use planhub_core::error::{AppError, ErrorKind};
use planhub_database::Repositories;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, cors_config: &CorsConfig) -> Router {
    build_router(state)
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}

/// Runs the PlanHub notification server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting PlanHub notification server...");

    // ── Step 1: Repositories ─────────────────────────────────────
    info!(provider = ?config.database.provider, "Initializing repositories...");
    let repositories = Repositories::from_config(&config.database).await?;

    // ── Step 2: Services and realtime engine ─────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let cors = config.server.cors.clone();
    let state = AppState::new(config, repositories);
    let realtime = state.realtime.clone();

    // ── Step 3: Bind and serve ───────────────────────────────────
    let app = build_app(state, &cors);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, format!("Failed to bind {addr}"), e)
        })?;

    info!(addr = %addr, "PlanHub server listening");

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            realtime.shutdown();
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    // Open sockets get `shutdown_grace_seconds` to drain once the signal fires.
    tokio::select! {
        result = &mut server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        _ = async {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(grace_seconds = grace.as_secs(), "Graceful shutdown timed out");
        }
    }

    info!("PlanHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
