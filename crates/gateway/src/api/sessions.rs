//! Session management REST endpoints (spec.md §6.1).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// `POST /sessions` — creates a session, returns its record.
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.sessions.create() {
        Ok(session) => Json(session).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// `GET /sessions` — lists all sessions.
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

/// `GET /sessions/{id}` — fetches a session (messages, status, pending
/// approval) or 404.
pub async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.sessions.get(&id) {
        Some(session) => Json(session).into_response(),
        None => not_found(&id),
    }
}

/// `DELETE /sessions/{id}` — removes a session and its on-disk file.
pub async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    if state.sessions.delete(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&id)
    }
}

/// `GET /sessions/{id}/messages` — returns the ordered message log.
pub async fn list_messages(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.sessions.get(&id) {
        Some(session) => Json(serde_json::json!({"messages": session.messages})).into_response(),
        None => not_found(&id),
    }
}

fn not_found(session_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("no such session: {session_id}")})),
    )
        .into_response()
}
