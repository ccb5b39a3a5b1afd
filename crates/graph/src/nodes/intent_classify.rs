//! F.2 Intent classification — schema-constrained LM call (spec.md §4.F.2).

use std::sync::Arc;

use cp_domain::state::Intent;
use cp_domain::{Error, Result, TurnState};
use cp_model::{ModelAdapter, StructuredRequest};

use crate::prompts::{intent_schema, INTENT_SYSTEM_PROMPT};

/// Approximate the number of distinct sub-needs a task summary names, by
/// counting its clauses (SPEC_FULL §4.E: `identified_subneed_count` is
/// "derived from the task summary's clause count at `intent_classify`
/// time"). Splits on commas, semicolons, and the conjunctions "and"/"then",
/// each clause contributing at least one sub-need.
fn clause_count(summary: &str) -> u32 {
    let normalized = summary.replace(" and ", ",").replace(" then ", ",");
    let count = normalized
        .split([',', ';'])
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .count();
    count.max(1) as u32
}

pub async fn run(model: &Arc<dyn ModelAdapter>, state: &mut TurnState) -> Result<()> {
    // spec.md §4.F.2: with tool-calling disabled for this session, intent is
    // forced to `direct` without ever calling the LM.
    if !state.tool_calling_enabled {
        state.intent = Some(Intent::Direct);
        state.task_summary = Some(state.user_query.clone());
        state.suggested_tool = None;
        state.identified_subneed_count = clause_count(&state.user_query);
        return Ok(());
    }

    let user_prompt = format!(
        "Clinician request: {}\n\nExtracted entities: patients={:?}, drugs={:?}, actions={:?}",
        state.user_query,
        state.extracted_entities.patient_ids,
        state.extracted_entities.drug_mentions,
        state.extracted_entities.action_verbs,
    );

    let response = model
        .generate_structured(StructuredRequest {
            system_prompt: INTENT_SYSTEM_PROMPT.to_string(),
            user_prompt,
            schema: intent_schema(),
            temperature: 0.0,
        })
        .await?;

    let intent_str = response
        .get("intent")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::SchemaViolation("intent_classification missing `intent`".into()))?;

    state.intent = Some(match intent_str {
        "direct" => Intent::Direct,
        "tool_needed" => Intent::ToolNeeded,
        other => {
            return Err(Error::SchemaViolation(format!(
                "unexpected intent value `{other}`"
            )))
        }
    });
    state.task_summary = response.get("task_summary").and_then(|v| v.as_str()).map(String::from);
    state.suggested_tool = response
        .get("suggested_tool")
        .and_then(|v| v.as_str())
        .map(String::from);
    state.identified_subneed_count = state
        .task_summary
        .as_deref()
        .map(clause_count)
        .unwrap_or(1);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_model::mock::MockModelAdapter;
    use serde_json::json;

    #[tokio::test]
    async fn populates_intent_and_task_summary() {
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({
            "intent": "tool_needed",
            "task_summary": "check dofetilide safety",
            "suggested_tool": "check_drug_safety",
        }));
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);

        let mut state = TurnState::new("is dofetilide safe for my patient?");
        run(&model, &mut state).await.unwrap();

        assert_eq!(state.intent, Some(Intent::ToolNeeded));
        assert_eq!(state.suggested_tool.as_deref(), Some("check_drug_safety"));
    }

    #[tokio::test]
    async fn rejects_malformed_intent_value() {
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({"intent": "maybe", "task_summary": "x", "suggested_tool": null}));
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);

        let mut state = TurnState::new("q");
        assert!(run(&model, &mut state).await.is_err());
    }

    #[tokio::test]
    async fn tool_calling_disabled_forces_direct_without_calling_model() {
        let adapter = MockModelAdapter::new();
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);

        let mut state = TurnState::new("check drug interactions for my patient");
        state.tool_calling_enabled = false;
        run(&model, &mut state).await.unwrap();

        assert_eq!(state.intent, Some(Intent::Direct));
        assert!(state.suggested_tool.is_none());
        assert_eq!(state.identified_subneed_count, 1);
    }

    #[tokio::test]
    async fn multi_clause_task_summary_yields_more_than_one_subneed() {
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({
            "intent": "tool_needed",
            "task_summary": "check dofetilide safety, then review the ECG and flag any QT prolongation",
            "suggested_tool": "check_drug_safety",
        }));
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);

        let mut state = TurnState::new("is dofetilide safe given this ECG?");
        run(&model, &mut state).await.unwrap();

        assert!(state.identified_subneed_count > 1);
    }

    #[tokio::test]
    async fn single_clause_task_summary_yields_one_subneed() {
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({
            "intent": "tool_needed",
            "task_summary": "check dofetilide safety",
            "suggested_tool": "check_drug_safety",
        }));
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);

        let mut state = TurnState::new("is dofetilide safe?");
        run(&model, &mut state).await.unwrap();

        assert_eq!(state.identified_subneed_count, 1);
    }
}
