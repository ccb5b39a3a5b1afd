//! Prompt templates and declared schemas for the model-backed nodes.
//!
//! Grounded on `original_source/.../agent/prompts.py` and `schemas.py`;
//! exact wording is a parameter, not code (spec.md §1 NON-GOALS), so these
//! are representative rather than verbatim ports.

use cp_domain::schema::{FieldType, OutputSchema, SchemaField};

pub const INTENT_SYSTEM_PROMPT: &str = "You are a clinical triage assistant. \
Classify whether the clinician's request needs an external tool (drug \
safety lookup, literature search, patient record access, imaging) or can \
be answered directly from general medical knowledge.";

pub fn intent_schema() -> OutputSchema {
    OutputSchema::new("intent_classification")
        .field(
            "intent",
            SchemaField::new(FieldType::String).with_enum(["direct", "tool_needed"]),
            true,
        )
        .field(
            "task_summary",
            SchemaField::new(FieldType::String)
                .with_description("Clinical task framing, at most ~50 words"),
            true,
        )
        .field(
            "suggested_tool",
            SchemaField::new(FieldType::String).nullable(),
            true,
        )
}

pub const TOOL_SELECT_SYSTEM_PROMPT: &str = "You are selecting the next tool \
for a clinical decision-support agent. Choose exactly one registered tool \
(or \"none\" if the accumulated results already answer the clinician's \
question) and supply only the arguments that tool needs.";

/// Build the tool-select schema: `tool_name` enum over registered names
/// plus `"none"`, followed by the union of all tools' argument names as
/// nullable string fields, critical (patient-identifying) fields first
/// (spec.md §4.F.3 "critical-first ordering").
pub fn tool_select_schema(tool_names: &[String], all_arg_names: &[String]) -> OutputSchema {
    let mut names: Vec<String> = tool_names.to_vec();
    names.push("none".to_string());

    let mut schema = OutputSchema::new("tool_selection").field(
        "tool_name",
        SchemaField::new(FieldType::String).with_enum(names),
        true,
    );

    let mut ordered: Vec<&String> = all_arg_names.iter().collect();
    ordered.sort_by_key(|name| (!is_critical_field(name), name.as_str()));

    for name in ordered {
        schema = schema.field(name.clone(), SchemaField::new(FieldType::String).nullable(), true);
    }
    schema
}

fn is_critical_field(name: &str) -> bool {
    name.contains("patient") || name.contains("identifier")
}

pub const RESULT_CLASSIFY_SYSTEM_PROMPT: &str = "You are classifying the \
quality of a clinical tool's result so the agent can decide whether to \
retry, continue, or synthesize a response.";

pub fn result_classify_schema() -> OutputSchema {
    OutputSchema::new("result_classification")
        .field(
            "quality",
            SchemaField::new(FieldType::String).with_enum([
                "success_rich",
                "success_partial",
                "no_results",
                "error_retryable",
                "error_fatal",
            ]),
            true,
        )
        .field(
            "reasoning",
            SchemaField::new(FieldType::String).with_description("Brief justification"),
            true,
        )
}

pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are writing the final \
response to a clinician. Use the accumulated findings to answer their \
question in plain clinical language. Never mention tool names, source \
API names, or internal process vocabulary (e.g. do not say \"FDA API\", \
\"PubMed\", or name a tool by its programmatic name) — describe findings \
in clinician-facing terms only.";
