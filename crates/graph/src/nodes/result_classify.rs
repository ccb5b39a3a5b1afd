//! F.5 Result classification — schema-constrained LM call (spec.md §4.F.5).

use std::sync::Arc;

use cp_domain::state::ResultQuality;
use cp_domain::{Error, Result, TurnState};
use cp_model::{ModelAdapter, StructuredRequest};

use crate::prompts::{result_classify_schema, RESULT_CLASSIFY_SYSTEM_PROMPT};

pub async fn run(model: &Arc<dyn ModelAdapter>, state: &mut TurnState) -> Result<()> {
    let Some(latest) = state.tool_results.last() else {
        return Err(Error::Other("result_classify invoked with no tool result".into()));
    };

    let user_prompt = format!(
        "Tool: {}\nSucceeded: {}\nResult: {}",
        latest.tool_name, latest.success, latest.formatted_result
    );

    let response = model
        .generate_structured(StructuredRequest {
            system_prompt: RESULT_CLASSIFY_SYSTEM_PROMPT.to_string(),
            user_prompt,
            schema: result_classify_schema(),
            temperature: 0.0,
        })
        .await?;

    let quality_str = response
        .get("quality")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::SchemaViolation("result_classification missing `quality`".into()))?;

    state.last_result_classification = Some(match quality_str {
        "success_rich" => ResultQuality::SuccessRich,
        "success_partial" => ResultQuality::SuccessPartial,
        "no_results" => ResultQuality::NoResults,
        "error_retryable" => ResultQuality::ErrorRetryable,
        "error_fatal" => ResultQuality::ErrorFatal,
        other => return Err(Error::SchemaViolation(format!("unexpected quality value `{other}`"))),
    });
    state.last_result_summary = response.get("reasoning").and_then(|v| v.as_str()).map(String::from);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_domain::ToolResult;
    use cp_model::mock::MockModelAdapter;
    use serde_json::json;

    #[tokio::test]
    async fn classifies_rich_success() {
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({"quality": "success_rich", "reasoning": "boxed warning found"}));
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);

        let mut state = TurnState::new("q");
        state.tool_results.push(ToolResult::ok(
            "check_drug_safety",
            "FDA Safety Database",
            json!({}),
            json!({"has_warning": true}),
            "Dofetilide carries a boxed Torsade de Pointes warning.",
        ));

        run(&model, &mut state).await.unwrap();
        assert_eq!(state.last_result_classification, Some(ResultQuality::SuccessRich));
    }

    #[tokio::test]
    async fn errors_without_a_prior_tool_result() {
        let adapter = MockModelAdapter::new();
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);
        let mut state = TurnState::new("q");
        assert!(run(&model, &mut state).await.is_err());
    }
}
