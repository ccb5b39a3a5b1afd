//! F.4 Tool execution (spec.md §4.F.4). The interrupt-before pause itself is
//! owned by `GraphRuntime::start_turn`/`resume` — by the time this function
//! runs, a clinician has already approved the call (or approval was not
//! required for this tool).

use std::sync::Arc;

use cp_domain::tool_result::ErrorCategory;
use cp_domain::{Result, ToolResult, TurnState};
use cp_tools::{ToolRegistry, NONE_TOOL};
use serde_json::Value;

pub async fn run(tools: &Arc<ToolRegistry>, state: &mut TurnState) -> Result<()> {
    let tool_name = state.current_tool.clone().unwrap_or_else(|| NONE_TOOL.to_string());
    let args = state.current_args.clone().unwrap_or_else(|| serde_json::json!({}));

    let result = tools.execute(&tool_name, args.clone()).await;
    let label = tools
        .describe(&tool_name)
        .await
        .unwrap_or_else(|| tool_name.clone());

    let tool_result = to_tool_result(&tool_name, &label, args, result);
    state.tool_results.push(tool_result);
    state.step_count += 1;

    Ok(())
}

fn to_tool_result(tool_name: &str, label: &str, args: Value, result: Value) -> ToolResult {
    if let Some(message) = result.get("error").and_then(|v| v.as_str()) {
        return ToolResult::failed(
            tool_name,
            label,
            args,
            result.clone(),
            format!("{label} failed: {message}"),
            classify_error_message(message),
            message,
        );
    }
    if result.get("skipped").and_then(|v| v.as_bool()) == Some(true) {
        let reason = result
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or("No tool needed");
        return ToolResult::ok(tool_name, label, args, result.clone(), reason.to_string());
    }
    ToolResult::ok(tool_name, label, args, result.clone(), format_summary(&result))
}

fn classify_error_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("timed out") || lower.contains("connection") || lower.contains("timeout") {
        ErrorCategory::TransportTransient
    } else if lower.contains("required") || lower.contains("invalid") {
        ErrorCategory::Validation
    } else if lower.contains("not found") || lower.contains("no match") {
        ErrorCategory::NotFound
    } else {
        ErrorCategory::Internal
    }
}

/// A short clinician-readable one-liner built from a result's top-level
/// fields, used when the tool has no bespoke formatter.
fn format_summary(result: &Value) -> String {
    let Some(obj) = result.as_object() else {
        return result.to_string();
    };
    if obj.is_empty() {
        return "No data returned.".to_string();
    }
    obj.iter()
        .map(|(k, v)| format!("{k}: {}", compact(v)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("{} item(s)", items.len()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_tools::stubs::CheckDrugSafety;
    use std::collections::HashMap;

    #[tokio::test]
    async fn successful_call_is_recorded_and_advances_step_count() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(
                "check_drug_safety",
                "FDA boxed warnings",
                vec![("brand_name", "drug name")],
                Arc::new(CheckDrugSafety),
                HashMap::new(),
            )
            .await;

        let mut state = TurnState::new("is dofetilide safe?");
        state.current_tool = Some("check_drug_safety".into());
        state.current_args = Some(serde_json::json!({"brand_name": "dofetilide"}));

        run(&registry, &mut state).await.unwrap();

        assert_eq!(state.step_count, 1);
        assert_eq!(state.tool_results.len(), 1);
        assert!(state.tool_results[0].success);
    }

    #[tokio::test]
    async fn transient_failure_is_classified_transport_transient() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(
                "check_drug_safety",
                "FDA boxed warnings",
                vec![("brand_name", "drug name")],
                Arc::new(CheckDrugSafety),
                HashMap::new(),
            )
            .await;

        let mut state = TurnState::new("q");
        state.current_tool = Some("check_drug_safety".into());
        state.current_args = Some(serde_json::json!({"brand_name": "timeout-drug"}));

        run(&registry, &mut state).await.unwrap();

        let result = &state.tool_results[0];
        assert!(!result.success);
        assert_eq!(result.error_category, Some(ErrorCategory::TransportTransient));
    }

    #[tokio::test]
    async fn none_tool_is_skipped_without_advancing_failure() {
        let registry = Arc::new(ToolRegistry::new());
        let mut state = TurnState::new("q");
        state.current_tool = Some(NONE_TOOL.to_string());

        run(&registry, &mut state).await.unwrap();
        assert!(state.tool_results[0].success);
    }
}
