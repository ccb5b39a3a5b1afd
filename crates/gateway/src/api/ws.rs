//! Per-session duplex channel (spec.md §6.1): client sends `user_message`
//! or `tool_approval`, server streams the typed `GraphEvent` stream back.
//!
//! Grounded on `sa_gateway::nodes::ws`'s handshake/writer-task/reader-loop
//! shape (split sink/stream, `mpsc` outbound channel, a reader loop
//! dispatching inbound messages), repurposed for this spec's narrower
//! contract: no node auth handshake, one socket per session rather than
//! per remote worker node.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::Receiver;

use cp_graph::{GraphEvent, ResumeDecision};

use crate::state::AppState;

/// Client→server messages (spec.md §6.1).
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    UserMessage {
        content: String,
        #[serde(default)]
        image_base64: Option<String>,
    },
    ToolApproval {
        approved: bool,
        #[serde(default)]
        reason: Option<String>,
    },
}

/// `GET /sessions/{id}/ws` — upgrade to a duplex event stream for one
/// session's turns.
pub async fn session_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    if state.sessions.get(&session_id).is_none() {
        return axum::http::StatusCode::NOT_FOUND.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
        .into_response()
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: String) {
    let (mut sink, mut stream) = socket.split();

    while let Some(Ok(msg)) = stream.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let client_msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "ignoring unparseable ws message");
                continue;
            }
        };

        let events = match client_msg {
            ClientMessage::UserMessage { content, image_base64 } => {
                let image_data = image_base64.and_then(|b64| {
                    use base64::Engine;
                    base64::engine::general_purpose::STANDARD.decode(b64).ok()
                });
                state.runner.start_turn(&session_id, content, image_data).await
            }
            ClientMessage::ToolApproval { approved, reason } => {
                let decision = if approved {
                    ResumeDecision::Approve { args: None }
                } else {
                    ResumeDecision::Reject {
                        reason: reason.unwrap_or_else(|| "clinician declined".into()),
                    }
                };
                state.runner.resume_with_decision(&session_id, decision).await
            }
        };

        match events {
            Ok(rx) => {
                if forward_events(rx, &mut sink).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                let err_event = GraphEvent::Error {
                    kind: "request_rejected".into(),
                    message: e.to_string(),
                    recoverable: true,
                };
                if send(&mut sink, &err_event).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Drain a turn's event stream to the socket in order, stopping at the
/// first send failure (disconnected client) (spec.md §4.D ordering
/// guarantee — this loop never reorders or skips).
async fn forward_events(
    mut rx: Receiver<GraphEvent>,
    sink: &mut (impl SinkExt<Message> + Unpin),
) -> Result<(), ()> {
    while let Some(event) = rx.recv().await {
        send(sink, &event).await?;
    }
    Ok(())
}

async fn send(sink: &mut (impl SinkExt<Message> + Unpin), event: &GraphEvent) -> Result<(), ()> {
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(json)).await.map_err(|_| ())
}
