use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Graph runtime tuning
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Hard ceiling on tool-loop iterations per turn (spec.md §4.E, I6).
    #[serde(default = "d_tool_loop_ceiling")]
    pub tool_loop_ceiling: u32,
    /// Maximum number of same-args retries the error handler may request
    /// before falling back to `ask_user` (spec.md §4.F.6).
    #[serde(default = "d_retryable_retry_limit")]
    pub retryable_retry_limit: u32,
    /// Sampling temperature for the intent-classify node's constrained call.
    #[serde(default = "d_zero_temperature")]
    pub intent_temperature: f64,
    /// Sampling temperature for the tool-select node's constrained call.
    #[serde(default = "d_zero_temperature")]
    pub tool_select_temperature: f64,
    /// Sampling temperature for the result-classify node's constrained call.
    #[serde(default = "d_zero_temperature")]
    pub result_classify_temperature: f64,
    /// Sampling temperature for the synthesize node's free-form call.
    #[serde(default = "d_synthesize_temperature")]
    pub synthesize_temperature: f64,
    #[serde(default = "d_synthesize_max_tokens")]
    pub synthesize_max_tokens: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tool_loop_ceiling: d_tool_loop_ceiling(),
            retryable_retry_limit: d_retryable_retry_limit(),
            intent_temperature: d_zero_temperature(),
            tool_select_temperature: d_zero_temperature(),
            result_classify_temperature: d_zero_temperature(),
            synthesize_temperature: d_synthesize_temperature(),
            synthesize_max_tokens: d_synthesize_max_tokens(),
        }
    }
}

fn d_tool_loop_ceiling() -> u32 {
    5
}
fn d_retryable_retry_limit() -> u32 {
    2
}
fn d_zero_temperature() -> f64 {
    0.0
}
fn d_synthesize_temperature() -> f64 {
    0.5
}
fn d_synthesize_max_tokens() -> u32 {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = GraphConfig::default();
        assert_eq!(cfg.tool_loop_ceiling, 5);
        assert_eq!(cfg.retryable_retry_limit, 2);
        assert_eq!(cfg.intent_temperature, 0.0);
        assert_eq!(cfg.synthesize_temperature, 0.5);
        assert_eq!(cfg.synthesize_max_tokens, 256);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: GraphConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.tool_loop_ceiling, 5);
    }
}
