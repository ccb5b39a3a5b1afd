//! The Agent Runner (spec.md §4.G): orchestrates a turn end to end,
//! translating the Graph Runtime's internal events into the external Event
//! Channel and keeping the session store in sync.
//!
//! Grounded on `agent_runner.py::AgentRunner` (`start_turn` /
//! `resume_with_approval` / `_stream_execution`), adapted from its single
//! async-generator shape to a producer task plus a forwarding loop over a
//! bounded channel — the idiom `sa_gateway::runtime::turn` uses for
//! streaming a long-running task's progress to a caller.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, Sender};
use tokio::sync::Mutex as AsyncMutex;

use cp_domain::session::{PendingApproval, SessionStatus};
use cp_domain::{Error, Message, Result, TurnState};
use cp_graph::{GraphEvent, GraphRuntime, ResumeDecision, TurnOutcome};
use cp_sessions::SessionStore;
use cp_tools::NONE_TOOL;

use crate::clinical_trace;

const EVENT_CHANNEL_CAPACITY: usize = 64;

enum Mode {
    Start(TurnState),
    Resume(String, ResumeDecision),
}

fn role_to_history(role: &str) -> cp_domain::message::Role {
    use cp_domain::message::Role;
    match role {
        "assistant" => Role::Assistant,
        "tool" => Role::Tool,
        "system" => Role::System,
        _ => Role::User,
    }
}

/// Orchestrates turns for every session sharing one `GraphRuntime` and one
/// `SessionStore` (spec.md §5 "Shared resource policy"). Enforces that a
/// given session never runs two turns concurrently (spec.md §5).
pub struct AgentRunner {
    graph: Arc<GraphRuntime>,
    sessions: Arc<SessionStore>,
    turn_locks: RwLock<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl AgentRunner {
    pub fn new(graph: Arc<GraphRuntime>, sessions: Arc<SessionStore>) -> Self {
        Self {
            graph,
            sessions,
            turn_locks: RwLock::new(HashMap::new()),
        }
    }

    fn turn_lock(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        if let Some(lock) = self.turn_locks.read().get(session_id) {
            return lock.clone();
        }
        self.turn_locks
            .write()
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Begin a new turn (spec.md §4.G "Start turn"). Returns a channel the
    /// caller streams `GraphEvent`s from until it closes.
    pub async fn start_turn(
        self: &Arc<Self>,
        session_id: &str,
        user_query: impl Into<String>,
        image_data: Option<Vec<u8>>,
    ) -> Result<mpsc::Receiver<GraphEvent>> {
        let user_query = user_query.into();
        let Some(session) = self.sessions.get(session_id) else {
            return Err(Error::Other(format!("unknown session {session_id}")));
        };
        if session.pending_approval.is_some() {
            return Err(Error::Other(
                "a tool approval is pending; resume it before starting a new turn".into(),
            ));
        }

        let mut state = TurnState::new(user_query.clone());
        state.conversation_history = session
            .messages
            .iter()
            .map(|m| cp_domain::HistoryTurn {
                role: role_to_history(&m.role),
                content: m.content.clone(),
            })
            .collect();
        state.session_patient_id = session.selected_patient_id.clone();
        state.image_data = image_data;

        self.sessions.append_message(session_id, "user", user_query)?;
        self.sessions.set_status(session_id, SessionStatus::Processing)?;

        let (external_tx, external_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let runner = self.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            let lock = runner.turn_lock(&session_id);
            let _guard = lock.lock_owned().await;
            runner.drive_and_stream(session_id, Mode::Start(state), external_tx).await;
        });
        Ok(external_rx)
    }

    /// Resume a paused turn with the clinician's decision (spec.md §4.G
    /// "Resume with decision").
    pub async fn resume_with_decision(
        self: &Arc<Self>,
        session_id: &str,
        decision: ResumeDecision,
    ) -> Result<mpsc::Receiver<GraphEvent>> {
        let Some(session) = self.sessions.get(session_id) else {
            return Err(Error::Other(format!("unknown session {session_id}")));
        };
        let Some(pending) = session.pending_approval.clone() else {
            return Err(Error::Other("no tool approval is pending on this session".into()));
        };

        self.sessions.clear_pending_approval(session_id)?;
        self.sessions.set_status(session_id, SessionStatus::Processing)?;

        let (external_tx, external_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let runner = self.clone();
        let session_id = session_id.to_string();
        let checkpoint_id = pending.checkpoint_id;
        tokio::spawn(async move {
            let lock = runner.turn_lock(&session_id);
            let _guard = lock.lock_owned().await;
            runner
                .drive_and_stream(session_id, Mode::Resume(checkpoint_id, decision), external_tx)
                .await;
        });
        Ok(external_rx)
    }

    /// Drive the Graph Runtime to completion or a pause, forwarding events
    /// to `external_tx` as they arrive and updating the session store along
    /// the way. Never propagates an error to the caller — failures surface
    /// as an `Error` event on the channel, matching `agent_runner.py`'s
    /// blanket `except Exception` around both entry points.
    async fn drive_and_stream(&self, session_id: String, mode: Mode, external_tx: Sender<GraphEvent>) {
        let (internal_tx, mut internal_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let graph = self.graph.clone();
        let handle = tokio::spawn(async move {
            match mode {
                Mode::Start(state) => graph.start_turn(state, internal_tx).await,
                Mode::Resume(checkpoint_id, decision) => {
                    graph.resume(&checkpoint_id, decision, internal_tx).await
                }
            }
        });

        let mut node_durations: HashMap<String, u64> = HashMap::new();
        while let Some(event) = internal_rx.recv().await {
            match &event {
                GraphEvent::NodeEnd { node_id, duration_ms, .. } => {
                    node_durations.insert(node_id.clone(), *duration_ms);
                    let _ = external_tx.send(event).await;
                }
                GraphEvent::ToolApprovalRequest { tool_name, args, intent, checkpoint_id } => {
                    let _ = self.sessions.set_pending_approval(
                        &session_id,
                        PendingApproval {
                            tool_name: tool_name.clone(),
                            tool_args: args.clone(),
                            clinical_intent: intent.clone(),
                            checkpoint_id: checkpoint_id.clone(),
                        },
                    );
                    let _ = external_tx.send(event).await;
                }
                // Withheld until the join handle hands back the final state,
                // so the trace can be attached (spec.md §4.G).
                GraphEvent::Completion { .. } => break,
                // Withheld: the join handle's `Err(err)` below re-derives the
                // same `kind`/`message` and is the turn's one authoritative
                // terminal event (spec.md I5 — forwarding this one too would
                // emit two).
                GraphEvent::Error { .. } => break,
                _ => {
                    let _ = external_tx.send(event).await;
                }
            }
        }

        match handle.await {
            Ok(Ok(TurnOutcome::Completed(state))) => {
                let trace = clinical_trace::build(&state, &node_durations);
                let tool_calls_made = state.tool_results.iter().filter(|r| r.tool_name != NONE_TOOL).count();
                let final_response = state.final_response.clone().unwrap_or_default();

                let _ = self.sessions.append_message(&session_id, "assistant", final_response.clone());
                let _ = self.sessions.clear_pending_approval(&session_id);
                let _ = self.sessions.set_status(&session_id, SessionStatus::Idle);

                let _ = external_tx
                    .send(GraphEvent::Completion {
                        final_response,
                        tool_calls_made,
                        trace: Some(trace),
                    })
                    .await;
            }
            Ok(Ok(TurnOutcome::Paused { .. })) => {
                // Status and pending_approval were already recorded when the
                // ToolApprovalRequest event arrived above.
            }
            Ok(Err(err)) => {
                tracing::warn!(session_id, error = %err, "turn failed");
                let _ = self.sessions.set_status(&session_id, SessionStatus::Error);
                let _ = external_tx
                    .send(GraphEvent::Error {
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                        recoverable: false,
                    })
                    .await;
            }
            Err(join_err) => {
                tracing::error!(session_id, error = %join_err, "turn task panicked");
                let _ = self.sessions.set_status(&session_id, SessionStatus::Error);
                let _ = external_tx
                    .send(GraphEvent::Error {
                        kind: "internal_error".into(),
                        message: join_err.to_string(),
                        recoverable: false,
                    })
                    .await;
            }
        }
    }
}

/// Build a `Message` list a Model Adapter could consume directly from a
/// session's message log — convenience used by tests and future gateway
/// wiring (spec.md §4.A).
pub fn session_messages_as_model_messages(messages: &[cp_domain::session::SessionMessage]) -> Vec<Message> {
    messages
        .iter()
        .map(|m| match m.role.as_str() {
            "assistant" => Message::assistant(m.content.clone()),
            "tool" => Message::tool(m.content.clone()),
            "system" => Message::system(m.content.clone()),
            _ => Message::user(m.content.clone()),
        })
        .collect()
}
