use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::HistoryTurn;
use crate::tool_result::ToolResult;

/// Entities extracted deterministically from the user query and history by
/// the input-assembly node (spec.md §4.F.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub patient_ids: Vec<String>,
    pub drug_mentions: Vec<String>,
    pub action_verbs: Vec<String>,
    pub has_image: bool,
}

/// The binary intent label produced by the intent-classify node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Direct,
    ToolNeeded,
}

/// Quality classification of the most recent tool result (spec.md §4.F.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultQuality {
    SuccessRich,
    SuccessPartial,
    NoResults,
    ErrorRetryable,
    ErrorFatal,
}

impl ResultQuality {
    pub fn is_error(&self) -> bool {
        matches!(self, ResultQuality::ErrorRetryable | ResultQuality::ErrorFatal)
    }
}

/// The strategy chosen by the error-handler node (spec.md §4.F.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStrategy {
    RetrySame,
    RetryDifferentArgs,
    SkipAndContinue,
    AskUser,
}

/// The ~20-field turn state that flows through the seven graph nodes
/// (spec.md §3 "Turn state").
///
/// Allocated fresh at turn start with every turn-level output explicitly
/// nil (spec.md §4.G "Start turn"); mutated only through the Graph
/// Runtime's partial-update merge (append-only fields concatenate, scalars
/// overwrite); discarded after the terminal node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnState {
    // ── Inputs ──
    pub user_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<u8>>,
    #[serde(default)]
    pub conversation_history: Vec<HistoryTurn>,
    #[serde(default)]
    pub extracted_entities: ExtractedEntities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_image_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_patient_id: Option<String>,
    #[serde(default)]
    pub tool_calling_enabled: bool,
    #[serde(default)]
    pub thinking_enabled: bool,
    /// Pre-fetched chart summary for the selected patient (SPEC_FULL §3.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_context: Option<String>,

    // ── Intent (node 2) ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_tool: Option<String>,
    /// Clause count of `task_summary`, used by `is_done` (SPEC_FULL §4.E).
    #[serde(default)]
    pub identified_subneed_count: u32,

    // ── Tool loop (nodes 3-6) ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_args: Option<Value>,
    #[serde(default)]
    pub tool_results: Vec<ToolResult>,
    #[serde(default)]
    pub step_count: u32,
    #[serde(default)]
    pub retryable_retry_count: u32,

    // ── Result classification (node 5) ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result_classification: Option<ResultQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result_summary: Option<String>,

    // ── Error handling (node 6) ──
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_strategy: Option<ErrorStrategy>,

    // ── Output (node 7) ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_thinking: Option<String>,
}

impl TurnState {
    /// A fresh turn state for a new turn (spec.md §4.G): inputs populated,
    /// every turn-level output explicitly nil so a resumed/stale checkpoint
    /// can never leak a previous turn's output into a new one.
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            tool_calling_enabled: true,
            ..Default::default()
        }
    }

    /// True once the accumulated tool results answer every sub-need the
    /// task summary identified, or the hard ceiling has been reached.
    /// Centralized here per SPEC_FULL §4.E / §9's Open Question resolution;
    /// call sites: `cp_graph::routing::is_done`.
    pub fn subneeds_satisfied(&self) -> bool {
        self.step_count >= self.identified_subneed_count.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_turn_clears_outputs() {
        let s = TurnState::new("what is hypertension?");
        assert!(s.final_response.is_none());
        assert!(s.current_tool.is_none());
        assert!(s.tool_results.is_empty());
        assert_eq!(s.step_count, 0);
        assert!(s.tool_calling_enabled);
    }

    #[test]
    fn subneeds_satisfied_respects_minimum_one() {
        let mut s = TurnState::new("q");
        s.identified_subneed_count = 0;
        s.step_count = 0;
        assert!(!s.subneeds_satisfied());
        s.step_count = 1;
        assert!(s.subneeds_satisfied());
    }
}
