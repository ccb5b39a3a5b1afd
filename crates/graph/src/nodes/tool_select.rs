//! F.3 Tool selection — schema-constrained LM call (spec.md §4.F.3).

use std::sync::Arc;

use cp_domain::{Error, Result, TurnState};
use cp_model::{ModelAdapter, StructuredRequest};
use cp_tools::{ToolRegistry, NONE_TOOL};
use serde_json::{Map, Value};

use crate::prompts::{tool_select_schema, TOOL_SELECT_SYSTEM_PROMPT};

pub async fn run(
    model: &Arc<dyn ModelAdapter>,
    tools: &Arc<ToolRegistry>,
    state: &mut TurnState,
) -> Result<()> {
    let tool_names = tools.names().await;
    let arg_names = tools.all_arg_names().await;
    let listing = tools.prompt_listing().await;

    let prior = state
        .tool_results
        .iter()
        .map(|r| format!("- {}: {}", r.tool_name, r.formatted_result))
        .collect::<Vec<_>>()
        .join("\n");

    let user_prompt = format!(
        "Clinical task: {}\n\nAvailable tools:\n{}\n\nResults so far:\n{}",
        state.task_summary.as_deref().unwrap_or(&state.user_query),
        listing,
        if prior.is_empty() { "(none yet)" } else { &prior },
    );

    let response = model
        .generate_structured(StructuredRequest {
            system_prompt: TOOL_SELECT_SYSTEM_PROMPT.to_string(),
            user_prompt,
            schema: tool_select_schema(&tool_names, &arg_names),
            temperature: 0.0,
        })
        .await?;

    let Some(obj) = response.as_object() else {
        return Err(Error::SchemaViolation("tool_selection response is not an object".into()));
    };
    let tool_name = obj
        .get("tool_name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::SchemaViolation("tool_selection missing `tool_name`".into()))?
        .to_string();

    // spec.md §4.F.3: writes `current_args` with nulls filtered out.
    let mut args = Map::new();
    for name in &arg_names {
        if let Some(v) = obj.get(name) {
            if !v.is_null() {
                args.insert(name.clone(), v.clone());
            }
        }
    }

    state.current_tool = Some(tool_name.clone());
    state.current_args = Some(Value::Object(args));

    if tool_name != NONE_TOOL && !tools.is_registered(&tool_name).await {
        return Err(Error::ToolNotFound(tool_name));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_model::mock::MockModelAdapter;
    use serde_json::json;
    use std::collections::HashMap;

    struct Noop;

    #[async_trait::async_trait]
    impl cp_tools::ToolExecutor for Noop {
        async fn call(&self, _args: HashMap<String, Value>) -> cp_tools::ToolOutcome {
            cp_tools::ToolOutcome::ok(json!({}))
        }
    }

    #[tokio::test]
    async fn selects_tool_and_captures_args() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(
                "check_drug_safety",
                "FDA boxed warnings",
                vec![("brand_name", "drug name")],
                Arc::new(Noop),
                HashMap::new(),
            )
            .await;

        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({"tool_name": "check_drug_safety", "brand_name": "dofetilide"}));
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);

        let mut state = TurnState::new("is dofetilide safe?");
        run(&model, &registry, &mut state).await.unwrap();

        assert_eq!(state.current_tool.as_deref(), Some("check_drug_safety"));
        assert_eq!(state.current_args.unwrap()["brand_name"], json!("dofetilide"));
    }

    #[tokio::test]
    async fn unknown_tool_name_is_an_error() {
        let registry = Arc::new(ToolRegistry::new());
        let adapter = MockModelAdapter::new();
        adapter.push_structured(json!({"tool_name": "not_registered"}));
        let model: Arc<dyn ModelAdapter> = Arc::new(adapter);

        let mut state = TurnState::new("q");
        assert!(run(&model, &registry, &mut state).await.is_err());
    }
}
