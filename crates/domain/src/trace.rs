use serde::Serialize;

/// Structured domain trace events emitted across the clinical-pipeline crates.
///
/// Distinct from the client-facing event channel (`cp_graph::events`): these
/// are greppable operational log lines, not part of the session's external
/// contract.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TurnStarted {
        session_id: String,
        is_resume: bool,
    },
    NodeEntered {
        session_id: String,
        node_id: String,
    },
    ToolDispatched {
        session_id: String,
        tool_name: String,
        success: bool,
    },
    ApprovalRequested {
        session_id: String,
        tool_name: String,
    },
    ApprovalResolved {
        session_id: String,
        tool_name: String,
        approved: bool,
    },
    CheckpointTaken {
        session_id: String,
        checkpoint_id: String,
        node_id: String,
    },
    SessionResolved {
        session_id: String,
        is_new: bool,
    },
    SessionReset {
        session_id: String,
        reason: String,
    },
    TurnCompleted {
        session_id: String,
        tool_calls_made: usize,
        duration_ms: u64,
    },
    TurnFailed {
        session_id: String,
        kind: String,
        message: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "agent_event");
    }
}
