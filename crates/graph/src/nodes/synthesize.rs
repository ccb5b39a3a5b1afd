//! F.7 Response synthesis — free-form LM call, the turn's terminal node
//! (spec.md §4.F.7).

use std::sync::Arc;

use cp_domain::config::GraphConfig;
use cp_domain::thinking::split_thinking;
use cp_domain::{Result, TurnState};
use cp_model::{ModelAdapter, TextRequest};

use crate::prompts::SYNTHESIS_SYSTEM_PROMPT;

pub async fn run(model: &Arc<dyn ModelAdapter>, config: &GraphConfig, state: &mut TurnState) -> Result<()> {
    let mut findings = String::new();
    for result in &state.tool_results {
        findings.push_str("- ");
        findings.push_str(&result.formatted_result);
        findings.push('\n');
    }
    if let Some(image_findings) = &state.image_findings {
        findings.push_str("- Imaging: ");
        findings.push_str(image_findings);
        findings.push('\n');
    }
    if findings.is_empty() {
        findings.push_str("(no tool results; answer from general medical knowledge)\n");
    }

    let mut user_prompt = format!("Clinician question: {}\n\nFindings:\n{findings}", state.user_query);
    if let Some(clarification) = &state.clarification_request {
        user_prompt.push_str(&format!("\nNote: could not proceed automatically — {clarification}\n"));
    }

    // A thinking-enabled session asks the model to show its reasoning first
    // by pre-filling the opening marker (spec.md §4.A / §6.5); the visible
    // response and the captured reasoning are split back apart below.
    let assistant_prefix = state
        .thinking_enabled
        .then(|| cp_domain::thinking::THINKING_OPEN.to_string());

    let response = model
        .generate_text(TextRequest {
            system_prompt: SYNTHESIS_SYSTEM_PROMPT.to_string(),
            user_prompt,
            temperature: config.synthesize_temperature,
            max_tokens: config.synthesize_max_tokens,
            assistant_prefix,
        })
        .await?;

    let (visible, thinking) = split_thinking(&response);
    state.final_response = Some(visible);
    state.model_thinking = thinking;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_model::mock::MockModelAdapter;

    #[tokio::test]
    async fn produces_final_response_from_findings() {
        let adapter = MockModelAdapter::new();
        adapter.push_text("Dofetilide carries a risk of QT prolongation; monitor closely.");
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);
        let config = GraphConfig::default();

        let mut state = TurnState::new("is dofetilide safe?");
        state.tool_results.push(cp_domain::ToolResult::ok(
            "check_drug_safety",
            "FDA Safety Database",
            serde_json::json!({}),
            serde_json::json!({}),
            "Dofetilide carries a boxed Torsade de Pointes warning.",
        ));

        run(&model, &config, &mut state).await.unwrap();
        assert!(state.final_response.unwrap().contains("QT prolongation"));
    }

    #[tokio::test]
    async fn falls_back_to_general_knowledge_note_with_no_findings() {
        let adapter = MockModelAdapter::new();
        adapter.push_text("Hypertension is persistently elevated blood pressure.");
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);
        let config = GraphConfig::default();

        let mut state = TurnState::new("what is hypertension?");
        run(&model, &config, &mut state).await.unwrap();
        assert!(state.final_response.is_some());
    }

    #[tokio::test]
    async fn thinking_enabled_splits_reasoning_from_visible_response() {
        let adapter = MockModelAdapter::new();
        adapter.push_text(
            "<think>weighing QT risk vs benefit</think>Avoid dofetilide in this patient.",
        );
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);
        let config = GraphConfig::default();

        let mut state = TurnState::new("is dofetilide safe?");
        state.thinking_enabled = true;
        run(&model, &config, &mut state).await.unwrap();

        assert_eq!(state.final_response.as_deref(), Some("Avoid dofetilide in this patient."));
        assert_eq!(state.model_thinking.as_deref(), Some("weighing QT risk vs benefit"));
    }
}
