use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error category used to route a failed tool result through the error
/// handler node (spec.md §4.F.6 / §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Timeouts, 5xx responses, connection resets — worth a same-args retry.
    TransportTransient,
    /// Missing/ambiguous/invalid argument — worth asking the clinician.
    Validation,
    /// Tool ran fine but found nothing.
    NotFound,
    /// Anything else — internal/unclassified.
    Internal,
}

/// The outcome of a single tool execution (spec.md §3 "Tool result").
///
/// Created once in the tool-execute node, appended to the turn state's
/// append-only `tool_results` list, never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    /// Clinician-facing label, e.g. "FDA Safety Database".
    pub tool_label: String,
    pub args: Value,
    /// Raw structured result returned by the executor (or `{"error": ...}`).
    pub result: Value,
    /// Clinician-friendly formatted string derived from `result`.
    pub formatted_result: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ToolResult {
    pub fn ok(
        tool_name: impl Into<String>,
        tool_label: impl Into<String>,
        args: Value,
        result: Value,
        formatted_result: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_label: tool_label.into(),
            args,
            result,
            formatted_result: formatted_result.into(),
            success: true,
            error_category: None,
            error_message: None,
        }
    }

    pub fn failed(
        tool_name: impl Into<String>,
        tool_label: impl Into<String>,
        args: Value,
        result: Value,
        formatted_result: impl Into<String>,
        category: ErrorCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_label: tool_label.into(),
            args,
            result,
            formatted_result: formatted_result.into(),
            success: false,
            error_category: Some(category),
            error_message: Some(message.into()),
        }
    }

    /// A synthetic result recorded when the clinician rejects a proposed
    /// tool call during the approval gate (spec.md §4.G "Resume with
    /// decision").
    pub fn rejected(tool_name: impl Into<String>, args: Value, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            tool_name: tool_name.into(),
            tool_label: "Clinician Decision".into(),
            args,
            result: serde_json::json!({"rejected": true, "reason": reason}),
            formatted_result: format!("Action not taken: {reason}"),
            success: false,
            error_category: Some(ErrorCategory::Validation),
            error_message: Some(reason),
        }
    }
}
