use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model adapter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible completions endpoint.
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Model identifier sent in each request body.
    #[serde(default = "d_model")]
    pub model: String,
    /// Name of the environment variable holding the bearer token, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            model: d_model(),
            api_key_env: None,
        }
    }
}

fn d_base_url() -> String {
    "http://127.0.0.1:8000/v1".into()
}
fn d_model() -> String {
    "gemma-3-4b-it".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_api_key_env() {
        let cfg = ModelConfig::default();
        assert!(cfg.api_key_env.is_none());
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: ModelConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.base_url, "http://127.0.0.1:8000/v1");
        assert_eq!(cfg.model, "gemma-3-4b-it");
    }
}
