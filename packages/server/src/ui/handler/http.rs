//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use kokoro_shared::time::timestamp_to_rfc3339;

use crate::{
    domain::{Identity, Mode, Topic},
    engine::MatchOutcome,
    protocol::{MatchRequest, MatchResponse, RoomSummaryDto},
    ui::state::AppState,
};

/// `POST /api/match`: stateless-request matching.
///
/// Safe to call repeatedly while waiting: an already-matched identity
/// gets the same room id on every poll. Validation failures never touch
/// engine state.
pub async fn match_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, (StatusCode, Json<serde_json::Value>)> {
    let (identity, topic, mode) = validate_match_request(request)?;

    let now = state.clock.now_millis();
    let mut engine = state.engine.lock().await;
    match engine.poll_match(identity, topic, mode, now) {
        MatchOutcome::Matched { room_id, partner } => {
            Ok(Json(MatchResponse::matched(&room_id, &partner)))
        }
        MatchOutcome::Waiting => Ok(Json(MatchResponse::waiting())),
    }
}

fn validate_match_request(
    request: MatchRequest,
) -> Result<(Identity, Topic, Mode), (StatusCode, Json<serde_json::Value>)> {
    let missing = || {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Missing parameters"})),
        )
    };

    let identity = request
        .identity
        .and_then(|v| Identity::try_from(v).ok())
        .ok_or_else(missing)?;
    let topic = request
        .topic
        .and_then(|v| Topic::try_from(v).ok())
        .ok_or_else(missing)?;
    let mode = request
        .mode
        .and_then(|v| v.parse::<Mode>().ok())
        .ok_or_else(missing)?;

    Ok((identity, topic, mode))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get summaries of all active rooms (observation endpoint)
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let engine = state.engine.lock().await;

    let mut summaries: Vec<RoomSummaryDto> = engine
        .rooms()
        .map(|room| RoomSummaryDto {
            id: room.id.as_str().to_string(),
            members: room.members.len(),
            messages: room.history.len(),
            created_at: timestamp_to_rfc3339(room.created_at),
        })
        .collect();
    summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Json(summaries)
}
