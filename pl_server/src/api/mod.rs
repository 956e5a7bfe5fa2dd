//! HTTP API for the pool league server.
//!
//! This module exposes tournament scheduling over JSON: creating tournaments,
//! entering players, generating brackets and round-robin fixtures, entering
//! frame results and reading standings.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP
//! - **Tower**: Middleware for CORS and request IDs
//! - **TournamentManager**: Every operation runs in its own storage unit of work
//!
//! # Modules
//!
//! - [`tournaments`]: Tournament, participant, match and standings handlers
//! - [`request_id`]: Request correlation and HTTP metrics
//!
//! # Errors
//!
//! Failures are returned as `{"error": "...", "kind": "..."}` where `kind` is
//! one of `validation` (400), `not_found` (404), `state_conflict` (409) or
//! `storage` (503). Storage failures are safe to retry.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pl_server::api::{create_router, AppState};
//! use pl_server::config::TournamentDefaults;
//! use pool_league::db::MemoryRepository;
//! use pool_league::tournament::TournamentManager;
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let state = AppState {
//!     manager: Arc::new(TournamentManager::with_repository(Arc::new(MemoryRepository::new()))),
//!     defaults: TournamentDefaults::default(),
//! };
//!
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use pool_league::tournament::TournamentManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::TournamentDefaults;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
    pub defaults: TournamentDefaults,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET    /health                                          - Health check
/// GET    /api/v1/tournaments                              - List tournaments
/// POST   /api/v1/tournaments                              - Create tournament
/// GET    /api/v1/tournaments/:id                          - Get tournament
/// GET    /api/v1/tournaments/:id/participants             - Participants in seed order
/// POST   /api/v1/tournaments/:id/participants             - Enter player
/// DELETE /api/v1/tournaments/:id/participants/:pid        - Withdraw participant
/// POST   /api/v1/tournaments/:id/shuffle                  - Shuffle seeds
/// POST   /api/v1/tournaments/:id/start                    - Generate schedule
/// POST   /api/v1/tournaments/:id/reset                    - Back to draft
/// GET    /api/v1/tournaments/:id/matches                  - List matches
/// GET    /api/v1/tournaments/:id/matches/:mid             - Match with frames
/// POST   /api/v1/tournaments/:id/matches/:mid/frames      - Submit frames
/// GET    /api/v1/tournaments/:id/bracket                  - Matches by round
/// GET    /api/v1/tournaments/:id/standings                - Round-robin table
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/tournaments",
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route("/tournaments/{tournament_id}", get(tournaments::get_tournament))
        .route(
            "/tournaments/{tournament_id}/participants",
            get(tournaments::list_participants).post(tournaments::add_participant),
        )
        .route(
            "/tournaments/{tournament_id}/participants/{participant_id}",
            delete(tournaments::remove_participant),
        )
        .route(
            "/tournaments/{tournament_id}/shuffle",
            post(tournaments::shuffle_seeds),
        )
        .route(
            "/tournaments/{tournament_id}/start",
            post(tournaments::start_tournament),
        )
        .route(
            "/tournaments/{tournament_id}/reset",
            post(tournaments::reset_tournament),
        )
        .route(
            "/tournaments/{tournament_id}/matches",
            get(tournaments::list_matches),
        )
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}",
            get(tournaments::get_match),
        )
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/frames",
            post(tournaments::submit_frames),
        )
        .route(
            "/tournaments/{tournament_id}/bracket",
            get(tournaments::get_bracket),
        )
        .route(
            "/tournaments/{tournament_id}/standings",
            get(tournaments::list_standings),
        )
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` if storage is reachable, or `503 Service Unavailable` otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.4.0","storage":true,"timestamp":"2025-11-22T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = state.manager.health_check().await.is_ok();

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
