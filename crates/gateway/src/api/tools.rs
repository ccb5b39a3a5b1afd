//! `GET /tools` — lists registered tools with descriptions and argument
//! schemas (spec.md §6.1).

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    let tools = state.tools.list_definitions().await;
    let count = tools.len();
    Json(serde_json::json!({
        "tools": tools,
        "count": count,
    }))
}
