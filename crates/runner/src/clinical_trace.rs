//! Building the clinical reasoning trace attached to a turn's completion
//! event (spec.md §4.G, GLOSSARY "Clinical trace").
//!
//! Grounded on `agent_runner.py::_build_clinical_trace` /
//! `_describe_tool_call` / `_summarize_result` / `TOOL_CLINICAL_LABELS`.

use std::collections::HashMap;

use cp_domain::tool_result::ToolResult;
use cp_domain::TurnState;
use cp_graph::{ClinicalTrace, NodeId, TraceStep, TraceStepType};
use cp_tools::NONE_TOOL;

/// Clinician-facing labels for the fixed tool set (spec.md §1).
fn clinical_label(tool_name: &str) -> String {
    match tool_name {
        "check_drug_safety" => "FDA Safety Database".to_string(),
        "check_drug_interactions" => "Drug Interaction Check".to_string(),
        "search_medical_literature" => "Medical Literature (PubMed)".to_string(),
        "find_clinical_trials" => "Clinical Trials Registry".to_string(),
        "get_patient_record" => "Patient Records Search".to_string(),
        "update_patient_record" => "Patient Chart Update".to_string(),
        "analyze_medical_image" => "Medical Image Analysis".to_string(),
        other => other.replace('_', " "),
    }
}

fn describe_tool_call(result: &ToolResult) -> String {
    let args = &result.args;
    match result.tool_name.as_str() {
        "check_drug_safety" => {
            let drug = args.get("brand_name").and_then(|v| v.as_str()).unwrap_or("medication");
            format!("Checked safety profile for {drug}")
        }
        "check_drug_interactions" => {
            let drugs = args.get("drug_names").and_then(|v| v.as_array());
            match drugs.map(|d| d.len()) {
                Some(n) if n >= 2 => "Checked interactions between the listed medications".to_string(),
                _ => "Checked drug interactions".to_string(),
            }
        }
        "search_medical_literature" => {
            let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
            let truncated: String = query.chars().take(50).collect();
            format!("Searched medical literature for: {truncated}")
        }
        "find_clinical_trials" => {
            let condition = args.get("condition").and_then(|v| v.as_str()).unwrap_or("");
            format!("Searched clinical trials for {condition}")
        }
        "get_patient_record" => "Searched patient records".to_string(),
        "update_patient_record" => "Updated the patient chart".to_string(),
        other => format!("Consulted {}", clinical_label(other)),
    }
}

fn summarize_result(result: &ToolResult) -> String {
    let data = &result.result;
    match result.tool_name.as_str() {
        "check_drug_safety" => {
            if data.get("has_warning").and_then(|v| v.as_bool()) == Some(true) {
                "Found a boxed warning".to_string()
            } else {
                "No boxed warnings found".to_string()
            }
        }
        "check_drug_interactions" => {
            let n = data.get("interactions").and_then(|v| v.as_array()).map(|a| a.len()).unwrap_or(0);
            if n > 0 {
                format!("Found {n} potential interaction(s)")
            } else {
                "No interactions found".to_string()
            }
        }
        "search_medical_literature" => {
            let n = data.get("articles").and_then(|v| v.as_array()).map(|a| a.len()).unwrap_or(0);
            format!("Found {n} relevant article(s)")
        }
        "find_clinical_trials" => {
            let n = data.get("trials").and_then(|v| v.as_array()).map(|a| a.len()).unwrap_or(0);
            format!("Found {n} active trial(s)")
        }
        _ => "Completed successfully".to_string(),
    }
}

/// Build the turn's clinical trace: one thought step (if the model
/// surfaced thinking text), one step per successful tool call, and a
/// closing synthesis step.
pub fn build(state: &TurnState, node_durations: &HashMap<String, u64>) -> ClinicalTrace {
    let mut steps = Vec::new();
    let mut total_ms = 0u64;

    if let Some(thinking) = &state.model_thinking {
        let dur = node_durations.get(NodeId::IntentClassify.id()).copied().unwrap_or(0);
        total_ms += dur;
        let mut description = thinking.clone();
        if description.chars().count() > 500 {
            description = description.chars().take(500).collect::<String>() + "...";
        }
        steps.push(TraceStep {
            step_type: TraceStepType::Thought,
            label: "Clinical Reasoning".to_string(),
            description,
            duration_ms: dur,
            tool_name: None,
            tool_result_summary: None,
        });
    }

    let tool_execute_dur = node_durations.get(NodeId::ToolExecute.id()).copied().unwrap_or(0);
    for result in &state.tool_results {
        if !result.success || result.tool_name == NONE_TOOL {
            continue;
        }
        total_ms += tool_execute_dur;
        steps.push(TraceStep {
            step_type: TraceStepType::ToolCall,
            label: clinical_label(&result.tool_name),
            description: describe_tool_call(result),
            duration_ms: tool_execute_dur,
            tool_name: Some(result.tool_name.clone()),
            tool_result_summary: Some(summarize_result(result)),
        });
    }

    let synth_dur = node_durations.get(NodeId::Synthesize.id()).copied().unwrap_or(0);
    total_ms += synth_dur;
    steps.push(TraceStep {
        step_type: TraceStepType::Synthesis,
        label: "Response Synthesis".to_string(),
        description: "Combined findings into a clinical response".to_string(),
        duration_ms: synth_dur,
        tool_name: None,
        tool_result_summary: None,
    });

    let tools_consulted = steps.iter().filter(|s| matches!(s.step_type, TraceStepType::ToolCall)).count();

    ClinicalTrace {
        steps,
        total_duration_ms: total_ms,
        tools_consulted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn includes_one_step_per_successful_tool_call_plus_synthesis() {
        let mut state = TurnState::new("is dofetilide safe?");
        state.tool_results.push(ToolResult::ok(
            "check_drug_safety",
            "FDA Safety Database",
            json!({"brand_name": "dofetilide"}),
            json!({"has_warning": true}),
            "boxed warning found",
        ));
        let mut durations = HashMap::new();
        durations.insert(NodeId::ToolExecute.id().to_string(), 42u64);
        durations.insert(NodeId::Synthesize.id().to_string(), 8u64);

        let trace = build(&state, &durations);
        assert_eq!(trace.tools_consulted, 1);
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.total_duration_ms, 50);
    }

    #[test]
    fn failed_tool_calls_are_excluded_from_the_trace() {
        let mut state = TurnState::new("q");
        state.tool_results.push(ToolResult::failed(
            "check_drug_safety",
            "FDA Safety Database",
            json!({}),
            json!({"error": "boom"}),
            "failed",
            cp_domain::tool_result::ErrorCategory::Internal,
            "boom",
        ));
        let trace = build(&state, &HashMap::new());
        assert_eq!(trace.tools_consulted, 0);
        assert_eq!(trace.steps.len(), 1); // synthesis step only
    }
}
