use cp_domain::{OutputSchema, Result};
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A free-form text generation request (spec.md §4.A "generate text").
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// An assistant-turn prefix to pre-fill before generation starts
    /// (spec.md §4.A). `None` when the call has nothing to seed the
    /// response with.
    pub assistant_prefix: Option<String>,
}

/// A schema-constrained generation request (spec.md §4.A "generate
/// constrained"). The adapter is responsible for getting the backend to
/// emit JSON that satisfies `schema`; if the backend has no native
/// constrained-decoding mode the adapter validates the response itself
/// and returns `Error::SchemaViolation` on mismatch.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub schema: OutputSchema,
    pub temperature: f64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core adapter trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The two-operation contract every node talks to the language model
/// through (spec.md §4.A "Model Adapter").
///
/// Deliberately narrower than a general-purpose provider trait: there is no
/// streaming, no native tool-calling, no embeddings. Every node either wants
/// prose (`generate_text`, used by synthesize) or a value that conforms to
/// a declared schema (`generate_structured`, used by every classification
/// and selection node).
#[async_trait::async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Free-form generation, used for the final clinician-facing response.
    async fn generate_text(&self, req: TextRequest) -> Result<String>;

    /// Schema-constrained generation, used for every intermediate decision.
    async fn generate_structured(&self, req: StructuredRequest) -> Result<Value>;
}
