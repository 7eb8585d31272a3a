// Shared HTTP response types and plain HTTP routes.

use crate::interface_adapters::protocol::RoomDto;
use crate::interface_adapters::state::AppState;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string for consistent JSON error responses.
    pub error: String,
}

/// Room directory, the same list pushed to sockets as `roomsData`.
pub async fn list_rooms_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rooms: Vec<RoomDto> = state
        .registry
        .rooms_data()
        .await
        .into_iter()
        .map(RoomDto::from)
        .collect();
    Json(rooms)
}

pub async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not found".to_string(),
        }),
    )
}
