//! Uniform dispatch over heterogeneous async I/O tools (spec.md §4.B).

use std::collections::HashMap;
use std::sync::Arc;

use cp_domain::tool_result::ErrorCategory;
use serde_json::Value;
use tokio::sync::RwLock;

/// Sentinel tool name meaning "no tool needed" (spec.md §4.B).
pub const NONE_TOOL: &str = "none";

/// A registered tool's public shape, for the `GET /tools` listing (spec.md
/// §6.1). Deliberately excludes the executor and remap — those are
/// dispatch-internal.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub args: Vec<(String, String)>,
}

/// The outcome of a single executor invocation. Executors never raise
/// across the registry boundary (spec.md §6.3) — argument-shape problems,
/// transport failures, and empty results are all represented here instead.
pub enum ToolOutcome {
    Ok(Value),
    Err {
        category: ErrorCategory,
        message: String,
    },
}

impl ToolOutcome {
    pub fn ok(value: Value) -> Self {
        ToolOutcome::Ok(value)
    }

    pub fn err(category: ErrorCategory, message: impl Into<String>) -> Self {
        ToolOutcome::Err {
            category,
            message: message.into(),
        }
    }
}

/// A single tool's async executor. Implementations accept a keyword-argument
/// map (post remap, nulls already dropped) and return a structured outcome;
/// they must never panic or propagate an error across this boundary — the
/// closest Rust gets to the original's "catch `TypeError`, return an error
/// dict" behavior is returning `ToolOutcome::Err` from a failed
/// deserialization of `args` into the executor's own expected shape.
#[async_trait::async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn call(&self, args: HashMap<String, Value>) -> ToolOutcome;
}

/// A single registered tool: name, clinician-facing description, its
/// argument schema (for prompt construction), its executor, and an
/// optional rename from schema-field name to executor-parameter name
/// (spec.md §4.B).
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// arg name -> short description, in declaration order (used for the
    /// deterministic prompt listing).
    pub args: Vec<(String, String)>,
    pub executor: Arc<dyn ToolExecutor>,
    pub remap: HashMap<String, String>,
}

/// Name -> {description, argument schema, executor, argument remap}
/// dispatch table (spec.md §4.B). Frozen after startup: built once, then
/// shared read-only across every session's turns (spec.md §5 "Shared
/// resource policy").
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, ToolDefinition>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Last registration for a given name wins.
    pub async fn register(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        args: Vec<(&str, &str)>,
        executor: Arc<dyn ToolExecutor>,
        remap: HashMap<String, String>,
    ) {
        let name = name.into();
        let def = ToolDefinition {
            name: name.clone(),
            description: description.into(),
            args: args
                .into_iter()
                .map(|(n, d)| (n.to_string(), d.to_string()))
                .collect(),
            executor,
            remap,
        };
        self.tools.write().await.insert(name, def);
    }

    pub async fn names(&self) -> Vec<String> {
        self.tools.read().await.keys().cloned().collect()
    }

    pub async fn is_registered(&self, name: &str) -> bool {
        self.tools.read().await.contains_key(name)
    }

    /// Clinician-facing description for a registered tool, used as the
    /// `tool_label` recorded on a `ToolResult` (spec.md §3 "Tool result").
    pub async fn describe(&self, name: &str) -> Option<String> {
        self.tools.read().await.get(name).map(|def| def.description.clone())
    }

    /// The union of every registered tool's argument names, sorted and
    /// deduplicated — used to build the tool-select schema (spec.md §4.F.3),
    /// since the schema must cover whichever tool the model picks.
    pub async fn all_arg_names(&self) -> Vec<String> {
        let tools = self.tools.read().await;
        let mut names: Vec<String> = tools
            .values()
            .flat_map(|def| def.args.iter().map(|(n, _)| n.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Registered tools' names, descriptions, and argument schemas, sorted
    /// by name, for the Session API's `GET /tools` listing (spec.md §6.1).
    pub async fn list_definitions(&self) -> Vec<ToolSummary> {
        let tools = self.tools.read().await;
        let mut out: Vec<ToolSummary> = tools
            .values()
            .map(|def| ToolSummary {
                name: def.name.clone(),
                description: def.description.clone(),
                args: def.args.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Deterministic multi-line listing for prompt construction (spec.md
    /// §4.B `prompt_listing`): one `- name: arg1, arg2 (description)` line
    /// per registered tool in registration order, terminated by the
    /// sentinel "- none: no tool needed" line.
    pub async fn prompt_listing(&self) -> String {
        let tools = self.tools.read().await;
        let mut names: Vec<&String> = tools.keys().collect();
        names.sort();
        let mut lines = Vec::with_capacity(names.len() + 1);
        for name in names {
            let def = &tools[name];
            let args_str = def
                .args
                .iter()
                .map(|(n, _)| n.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("- {}: {} ({})", def.name, args_str, def.description));
        }
        lines.push("- none: no tool needed".to_string());
        lines.join("\n")
    }

    /// Dispatch a tool call (spec.md §4.B `execute`). Never raises across
    /// its boundary: every path returns a `{error: string}`-shaped value,
    /// a `{skipped: true, reason}` marker, or the executor's own result.
    pub async fn execute(&self, tool_name: &str, args: Value) -> Value {
        if tool_name == NONE_TOOL || tool_name.is_empty() {
            tracing::debug!("tool execute: skipped, no tool needed");
            return serde_json::json!({"skipped": true, "reason": "No tool needed"});
        }

        let tools = self.tools.read().await;
        let Some(def) = tools.get(tool_name) else {
            let message = format!("Unknown tool: {tool_name}");
            tracing::warn!(tool = tool_name, "tool execute: {message}");
            return serde_json::json!({"error": message});
        };

        let remapped = remap_and_drop_nulls(args, &def.remap);
        let executor = def.executor.clone();
        drop(tools);

        match executor.call(remapped).await {
            ToolOutcome::Ok(value) => value,
            ToolOutcome::Err { message, .. } => {
                tracing::warn!(tool = tool_name, "tool execute failed: {message}");
                serde_json::json!({"error": message})
            }
        }
    }
}

/// Rename schema-field keys to executor-parameter names and drop any key
/// whose value is JSON `null` (spec.md §4.B `execute`).
fn remap_and_drop_nulls(args: Value, remap: &HashMap<String, String>) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    let Some(obj) = args.as_object() else {
        return out;
    };
    for (schema_field, value) in obj {
        if value.is_null() {
            continue;
        }
        let param_name = remap.get(schema_field).cloned().unwrap_or_else(|| schema_field.clone());
        out.insert(param_name, value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait::async_trait]
    impl ToolExecutor for Echo {
        async fn call(&self, args: HashMap<String, Value>) -> ToolOutcome {
            ToolOutcome::ok(serde_json::json!({"echo": args}))
        }
    }

    struct AlwaysFails;

    #[async_trait::async_trait]
    impl ToolExecutor for AlwaysFails {
        async fn call(&self, _args: HashMap<String, Value>) -> ToolOutcome {
            ToolOutcome::err(ErrorCategory::Internal, "boom")
        }
    }

    #[tokio::test]
    async fn execute_none_returns_skipped_marker_without_dispatch() {
        let registry = ToolRegistry::new();
        let result = registry.execute(NONE_TOOL, serde_json::json!({})).await;
        assert_eq!(result["skipped"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn execute_unknown_tool_returns_error_shape() {
        let registry = ToolRegistry::new();
        let result = registry.execute("not_a_real_tool", serde_json::json!({})).await;
        assert!(result["error"].as_str().unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn execute_drops_null_args_and_applies_remap() {
        let registry = ToolRegistry::new();
        let mut remap = HashMap::new();
        remap.insert("drug_name".to_string(), "brand_name".to_string());
        registry
            .register(
                "echo_tool",
                "test",
                vec![("drug_name", "drug")],
                Arc::new(Echo),
                remap,
            )
            .await;

        let result = registry
            .execute(
                "echo_tool",
                serde_json::json!({"drug_name": "dofetilide", "patient_id": null}),
            )
            .await;
        let echoed = &result["echo"];
        assert_eq!(echoed["brand_name"], serde_json::json!("dofetilide"));
        assert!(echoed.get("patient_id").is_none());
    }

    #[tokio::test]
    async fn execute_converts_executor_error_to_error_shape() {
        let registry = ToolRegistry::new();
        registry
            .register("failing", "test", vec![], Arc::new(AlwaysFails), HashMap::new())
            .await;
        let result = registry.execute("failing", serde_json::json!({})).await;
        assert_eq!(result["error"], serde_json::json!("boom"));
    }

    #[tokio::test]
    async fn prompt_listing_contains_registered_tool_and_none_sentinel() {
        let registry = ToolRegistry::new();
        registry
            .register(
                "check_drug_safety",
                "FDA boxed warnings lookup",
                vec![("drug_name", "brand or generic name")],
                Arc::new(Echo),
                HashMap::new(),
            )
            .await;
        let listing = registry.prompt_listing().await;
        assert!(listing.lines().any(|l| l.starts_with("- check_drug_safety:")));
        assert!(listing.ends_with("- none: no tool needed"));
    }
}
