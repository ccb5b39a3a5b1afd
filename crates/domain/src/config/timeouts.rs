use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Timeouts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Per-tool-call wall clock timeout (spec.md §4.F.4 edge cases).
    #[serde(default = "d_tool_call_secs")]
    pub tool_call_secs: u64,
    /// Per-model-call wall clock timeout.
    #[serde(default = "d_lm_call_secs")]
    pub lm_call_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            tool_call_secs: d_tool_call_secs(),
            lm_call_secs: d_lm_call_secs(),
        }
    }
}

impl TimeoutsConfig {
    pub fn tool_call(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tool_call_secs)
    }

    pub fn lm_call(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.lm_call_secs)
    }
}

fn d_tool_call_secs() -> u64 {
    30
}
fn d_lm_call_secs() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = TimeoutsConfig::default();
        assert_eq!(cfg.tool_call_secs, 30);
        assert_eq!(cfg.lm_call_secs, 120);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: TimeoutsConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.tool_call_secs, 30);
    }
}
