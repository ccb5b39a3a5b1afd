/// Shared error type used across all clinical-pipeline crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("model adapter {adapter}: {message}")]
    Adapter { adapter: String, message: String },

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("cancelled")]
    Cancelled,

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The `error` event's `kind` discriminator for this variant (spec.md
    /// §8 boundary behaviors: `schema_violation` for non-conforming
    /// constrained generation, `cancelled` for an external cancellation
    /// signal; every other variant falls back to a stable taxonomy label).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "transport_error",
            Error::Timeout(_) => "timeout",
            Error::Adapter { .. } => "adapter_error",
            Error::SchemaViolation(_) => "schema_violation",
            Error::ToolNotFound(_) => "tool_not_found",
            Error::Cancelled => "cancelled",
            Error::Config(_) => "config_error",
            Error::Other(_) => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
