//! Integration tests for the HTTP API.
//!
//! Drives the full router over in-memory storage: tournament lifecycle,
//! frame entry, error mapping and request correlation.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pl_server::api::{AppState, create_router};
use pl_server::config::TournamentDefaults;
use pool_league::db::MemoryRepository;
use pool_league::tournament::TournamentManager;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

/// Helper to create a router over fresh in-memory storage
fn create_test_server() -> Router {
    let manager = TournamentManager::with_repository(Arc::new(MemoryRepository::new()));
    create_router(AppState {
        manager: Arc::new(manager),
        defaults: TournamentDefaults::default(),
    })
}

/// Send one request and return status plus parsed JSON body (Null when empty)
async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Create a tournament and enter `players` players, returning the tournament ID
async fn tournament_with_players(app: &Router, format: &str, players: i64, race_to: u32) -> i64 {
    let (status, tournament) = send(
        app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({ "name": "Tuesday Night 9-Ball", "format": format, "race_to": race_to })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = tournament["id"].as_i64().unwrap();

    for player_id in 1..=players {
        let (status, _) = send(
            app,
            "POST",
            &format!("/api/v1/tournaments/{id}/participants"),
            Some(json!({ "player_id": player_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    id
}

fn frames_for(winner: i64, count: u32) -> Value {
    let frames: Vec<Value> = (1..=count)
        .map(|n| json!({ "frame_number": n, "winner_participant_id": winner }))
        .collect();
    json!({ "frames": frames })
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_server();

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], true);
}

// ============================================================================
// Tournament Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_create_uses_server_defaults() {
    let app = create_test_server();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({ "name": "Spring League", "format": "round-robin" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "draft");
    assert_eq!(body["race_to"], 5);
    assert_eq!(body["round_robin_cycles"], 1);

    let (status, list) = send(&app, "GET", "/api/v1/tournaments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_entry_returns_null() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "round-robin", 1, 3).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/participants"),
        Some(json!({ "player_id": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_round_robin_flow() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "round-robin", 4, 3).await;

    let (status, matches) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/start"),
        Some(json!({ "format": "round-robin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let matches = matches.as_array().unwrap().clone();
    assert_eq!(matches.len(), 6);

    let first = &matches[0];
    let match_id = first["id"].as_i64().unwrap();
    let winner = first["participant1_id"].as_i64().unwrap();

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/matches/{match_id}/frames"),
        Some(frames_for(winner, 3)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["winner_id"], winner);
    assert_eq!(outcome["score1"], 3);

    let (_, detail) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/matches/{match_id}"),
        None,
    )
    .await;
    assert_eq!(detail["frames"].as_array().unwrap().len(), 3);
    assert_eq!(detail["status"], "completed");

    let (status, standings) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/standings"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let leader = &standings.as_array().unwrap()[0];
    assert_eq!(leader["participant_id"], winner);
    assert_eq!(leader["rank"], 1);
    assert_eq!(leader["frame_difference"], 3);

    let (_, tournament) = send(&app, "GET", &format!("/api/v1/tournaments/{id}"), None).await;
    assert_eq!(tournament["status"], "in-progress");
}

#[tokio::test]
async fn test_bracket_rounds_are_named() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "single-elimination", 3, 2).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/start"),
        Some(json!({ "format": "single-elimination" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, rounds) = send(&app, "GET", &format!("/api/v1/tournaments/{id}/bracket"), None).await;
    assert_eq!(status, StatusCode::OK);
    let rounds = rounds.as_array().unwrap();
    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[0]["name"], "Semi-Finals");
    // Top seed's walkover is already settled
    let semis = rounds[0]["matches"].as_array().unwrap();
    assert_eq!(semis.len(), 2);
    assert_eq!(semis[0]["status"], "completed");
    assert_eq!(semis[1]["status"], "pending");
    assert_eq!(rounds[1]["name"], "Finals");
    assert!(rounds[1]["matches"][0]["participant1_id"].is_i64());
}

#[tokio::test]
async fn test_reset_returns_to_draft() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "round-robin", 3, 3).await;

    send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/start"),
        Some(json!({ "format": "round-robin" })),
    )
    .await;

    let (status, tournament) = send(&app, "POST", &format!("/api/v1/tournaments/{id}/reset"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tournament["status"], "draft");

    let (_, matches) = send(&app, "GET", &format!("/api/v1/tournaments/{id}/matches"), None).await;
    assert!(matches.as_array().unwrap().is_empty());

    let (_, participants) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/participants"),
        None,
    )
    .await;
    assert_eq!(participants.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_shuffle_assigns_every_seed() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "single-elimination", 5, 3).await;

    let (status, participants) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/shuffle"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut seeds: Vec<u64> = participants
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["seed"].as_u64().unwrap())
        .collect();
    seeds.sort_unstable();
    assert_eq!(seeds, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_withdraw_participant() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "round-robin", 2, 3).await;

    let (_, participants) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/participants"),
        None,
    )
    .await;
    let pid = participants[0]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/tournaments/{id}/participants/{pid}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/v1/tournaments/{id}/participants/{pid}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

// ============================================================================
// Error Mapping Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_tournament_is_not_found() {
    let app = create_test_server();

    let (status, body) = send(&app, "GET", "/api/v1/tournaments/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
    assert!(body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_invalid_race_to_is_bad_request() {
    let app = create_test_server();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({ "name": "Marathon", "format": "round-robin", "race_to": 51 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_start_with_one_player_is_bad_request() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "single-elimination", 1, 3).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/start"),
        Some(json!({ "format": "single-elimination" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_start_twice_is_conflict() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "round-robin", 2, 3).await;
    let uri = format!("/api/v1/tournaments/{id}/start");

    let (status, _) = send(&app, "POST", &uri, Some(json!({ "format": "round-robin" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "format": "round-robin" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "state_conflict");
}

#[tokio::test]
async fn test_frame_by_outsider_is_rejected() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "round-robin", 3, 3).await;

    let (_, matches) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/start"),
        Some(json!({ "format": "round-robin" })),
    )
    .await;
    let m = &matches.as_array().unwrap()[0];
    let match_id = m["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/matches/{match_id}/frames"),
        Some(frames_for(9_999, 1)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (_, detail) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/matches/{match_id}"),
        None,
    )
    .await;
    assert_eq!(detail["status"], "pending");
    assert!(detail["frames"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = create_test_server();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({ "name": "Bad Format", "format": "double-elimination" })),
    )
    .await;

    assert!(status.is_client_error());
}

// ============================================================================
// Request ID Tests
// ============================================================================

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "league-night-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "league-night-42"
    );
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let app = create_test_server();

    let request = Request::builder()
        .uri("/api/v1/tournaments")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_oversized_frame_number_is_bad_request() {
    let app = create_test_server();
    let id = tournament_with_players(&app, "round-robin", 2, 3).await;

    let (_, matches) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/start"),
        Some(json!({ "format": "round-robin" })),
    )
    .await;
    let m = &matches.as_array().unwrap()[0];
    let match_id = m["id"].as_i64().unwrap();
    let winner = m["participant1_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/matches/{match_id}/frames"),
        Some(json!({ "frames": [{ "frame_number": 3_000_000_000u64, "winner_participant_id": winner }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}
