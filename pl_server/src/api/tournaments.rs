//! Tournament API handlers.
//!
//! This module provides HTTP REST endpoints for tournament operations including:
//! - Creating and listing tournaments
//! - Entering and withdrawing participants, shuffling seeds
//! - Starting a tournament as a bracket or round-robin
//! - Submitting frame results and reading matches, brackets and standings
//! - Resetting a tournament back to draft
//!
//! # Examples
//!
//! Start a tournament with every participant in seed order:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/1/start \
//!   -H "Content-Type: application/json" \
//!   -d '{"format": "single-elimination"}'
//! ```
//!
//! Submit the frames of a match:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/1/matches/7/frames \
//!   -H "Content-Type: application/json" \
//!   -d '{"frames": [{"frame_number": 1, "winner_participant_id": 3}]}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use pool_league::tournament::{
    ErrorKind, Frame, Match, MatchOutcome, Participant, ParticipantId, RoundView, Standing,
    Tournament, TournamentConfig, TournamentError, TournamentFormat, TournamentId,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub format: TournamentFormat,
    pub race_to: Option<u32>,
    pub round_robin_cycles: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    pub player_id: i64,
    pub team_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StartTournamentRequest {
    pub format: TournamentFormat,
    /// Entrants, top seed first. Defaults to every participant in seed order.
    pub participants: Option<Vec<ParticipantId>>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitFramesRequest {
    pub frames: Vec<Frame>,
}

#[derive(Debug, Serialize)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub r#match: Match,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a tournament error to its HTTP status and client-safe body
pub fn error_response(err: TournamentError) -> ApiError {
    let kind = err.kind();
    let status = match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::Storage => StatusCode::SERVICE_UNAVAILABLE,
    };

    if kind == ErrorKind::Storage {
        tracing::error!(error = %err, "Storage failure");
    } else {
        tracing::debug!(error = %err, "Request rejected");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
            kind,
        }),
    )
}

/// Create a tournament in draft status.
///
/// `race_to` and `round_robin_cycles` fall back to the server defaults.
///
/// # Errors
///
/// - `400 Bad Request`: Empty name, race-to outside 1..=50 or zero cycles
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> Result<(StatusCode, Json<Tournament>), ApiError> {
    let config = TournamentConfig::new(request.name, request.format)
        .with_race_to(request.race_to.unwrap_or(state.defaults.race_to))
        .with_cycles(
            request
                .round_robin_cycles
                .unwrap_or(state.defaults.round_robin_cycles),
        );

    let tournament = state
        .manager
        .create_tournament(&config)
        .await
        .map_err(error_response)?;
    logging::log_tournament_event("created", tournament.id, &tournament.name);
    Ok((StatusCode::CREATED, Json(tournament)))
}

/// List all tournaments, newest first.
pub async fn list_tournaments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Tournament>>, ApiError> {
    state
        .manager
        .list_tournaments()
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Tournament>, ApiError> {
    state
        .manager
        .get_tournament(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Participants in seed order.
pub async fn list_participants(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    state
        .manager
        .seeded_participants(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Enter a player into a draft tournament.
///
/// # Response
///
/// `201 Created` with the participant, or `200 OK` with `null` if the player
/// was already entered.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Tournament already started
pub async fn add_participant(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<AddParticipantRequest>,
) -> Result<(StatusCode, Json<Option<Participant>>), ApiError> {
    let participant = state
        .manager
        .add_participant(tournament_id, request.player_id, request.team_id)
        .await
        .map_err(error_response)?;

    let status = if participant.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(participant)))
}

pub async fn remove_participant(
    State(state): State<AppState>,
    Path((tournament_id, participant_id)): Path<(TournamentId, ParticipantId)>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .remove_participant(tournament_id, participant_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Randomly reassign seeds `1..=n` to the participants of a draft tournament.
pub async fn shuffle_seeds(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    let participants = state
        .manager
        .shuffle_seeds(tournament_id)
        .await
        .map_err(error_response)?;
    logging::log_tournament_event(
        "seeds_shuffled",
        tournament_id,
        &format!("{} participants reseeded", participants.len()),
    );
    Ok(Json(participants))
}

/// Generate the schedule and move the tournament to in-progress.
///
/// # Request Body
///
/// ```json
/// {
///   "format": "round-robin",
///   "participants": [4, 2, 7]  // Optional, top seed first
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Fewer than two entrants or a repeated entrant
/// - `404 Not Found`: Tournament or listed participant doesn't exist
/// - `409 Conflict`: Tournament is not a draft
pub async fn start_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<StartTournamentRequest>,
) -> Result<(StatusCode, Json<Vec<Match>>), ApiError> {
    let matches = match request.participants {
        Some(ordered) => {
            state
                .manager
                .start_tournament(tournament_id, request.format, &ordered)
                .await
        }
        None => state.manager.start_seeded(tournament_id, request.format).await,
    }
    .map_err(error_response)?;

    metrics::tournaments_started_total(request.format.as_str());
    logging::log_tournament_event(
        "started",
        tournament_id,
        &format!("{} with {} matches", request.format, matches.len()),
    );
    Ok((StatusCode::CREATED, Json(matches)))
}

/// Replace the frames of a match.
///
/// # Response
///
/// ```json
/// {
///   "match_id": 7,
///   "status": "completed",
///   "winner_id": 3,
///   "score1": 5,
///   "score2": 2
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown frame winner, bad frame numbering, or both sides at the race
/// - `404 Not Found`: Tournament or match doesn't exist
/// - `409 Conflict`: Tournament is a draft, match has no opponent yet, or the
///   next-round match already has results
pub async fn submit_frames(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, i64)>,
    Json(request): Json<SubmitFramesRequest>,
) -> Result<Json<MatchOutcome>, ApiError> {
    let outcome = state
        .manager
        .submit_match_frames(tournament_id, match_id, &request.frames)
        .await
        .map_err(error_response)?;

    metrics::match_results_total(outcome.status.as_str());
    Ok(Json(outcome))
}

/// Delete the schedule and standings and return the tournament to draft.
pub async fn reset_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Tournament>, ApiError> {
    let tournament = state
        .manager
        .reset_tournament(tournament_id)
        .await
        .map_err(error_response)?;

    metrics::tournament_resets_total();
    logging::log_tournament_event("reset", tournament_id, "Tournament returned to draft");
    Ok(Json(tournament))
}

pub async fn list_matches(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Vec<Match>>, ApiError> {
    state
        .manager
        .list_matches(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_match(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, i64)>,
) -> Result<Json<MatchDetail>, ApiError> {
    let (m, frames) = state
        .manager
        .get_match(tournament_id, match_id)
        .await
        .map_err(error_response)?;
    Ok(Json(MatchDetail { r#match: m, frames }))
}

/// Matches grouped by round with display names, byes hidden.
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Vec<RoundView>>, ApiError> {
    state
        .manager
        .bracket_view(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Standings in rank order.
pub async fn list_standings(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Vec<Standing>>, ApiError> {
    state
        .manager
        .list_standings(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}
