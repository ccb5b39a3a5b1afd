mod graph;
mod model;
mod observability;
mod server;
mod sessions;
mod timeouts;

pub use graph::GraphConfig;
pub use model::ModelConfig;
pub use observability::ObservabilityConfig;
pub use server::{CorsConfig, ServerConfig};
pub use sessions::SessionsConfig;
pub use timeouts::TimeoutsConfig;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the clinical-pipeline gateway, loaded from a
/// TOML file and overlaid with environment variables at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
