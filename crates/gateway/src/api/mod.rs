//! The Session API (spec.md §6.1): REST session management plus a
//! per-session WebSocket duplex for turn events.

pub mod sessions;
pub mod tools;
pub mod ws;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the full gateway router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(sessions::list_sessions).post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/:id/messages", get(sessions::list_messages))
        .route("/sessions/:id/ws", get(ws::session_ws))
        .route("/tools", get(tools::list_tools))
        .route("/healthz", get(health))
}

async fn health() -> &'static str {
    "ok"
}
