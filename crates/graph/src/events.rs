//! The typed, ordered event stream a turn emits (spec.md §4.D).
//!
//! Grounded on `original_source/.../api/models/events.py`'s Pydantic event
//! hierarchy, translated into a single tagged Rust enum rather than a
//! class hierarchy — the wire shape (`event` discriminator + per-kind
//! fields) is identical.

use serde::Serialize;
use serde_json::Value;

/// One step of the clinical reasoning trace attached to a `completion`
/// event (spec.md §4.G, GLOSSARY "Clinical trace").
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStepType {
    Thought,
    ToolCall,
    Synthesis,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceStep {
    #[serde(rename = "type")]
    pub step_type: TraceStepType,
    pub label: String,
    pub description: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ClinicalTrace {
    pub steps: Vec<TraceStep>,
    pub total_duration_ms: u64,
    pub tools_consulted: usize,
}

/// A single event in a turn's ordered stream (spec.md §4.D). Events for a
/// given turn are emitted in execution order (I4); every turn's stream
/// contains exactly one terminal event, `Completion` xor `Error` (I5).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
#[serde(rename_all = "snake_case")]
pub enum GraphEvent {
    NodeStart {
        node_id: String,
        label: String,
    },
    NodeEnd {
        node_id: String,
        label: String,
        duration_ms: u64,
    },
    /// Terminal for this streaming epoch: the stream pauses here until
    /// `resume` is invoked (spec.md §4.D, §4.E interrupt-before contract).
    ToolApprovalRequest {
        tool_name: String,
        args: Value,
        intent: String,
        checkpoint_id: String,
    },
    ToolExecutionStart {
        tool_name: String,
        args: Value,
    },
    ToolExecutionEnd {
        tool_name: String,
        success: bool,
        result: Value,
        duration_ms: u64,
    },
    StreamingText {
        chunk: String,
        node_id: String,
    },
    /// `trace` is filled in by `cp-runner` before this event reaches the
    /// external Session API — the Graph Runtime itself has no notion of a
    /// clinical trace (spec.md §4.G).
    Completion {
        final_response: String,
        tool_calls_made: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace: Option<ClinicalTrace>,
    },
    Error {
        kind: String,
        message: String,
        recoverable: bool,
    },
}
