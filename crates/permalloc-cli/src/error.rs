use permalloc_core::builder::{BuildError, ConfigError};
use permalloc_core::graph::GraphError;

/// Errors that can end a `permalloc` run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A count on stdin was not a non-negative integer.
    #[error("invalid {what}: expected a non-negative integer, got '{value}'")]
    InputFormat { what: &'static str, value: String },

    /// Stdin ended before a count was read.
    #[error("missing {what}: input ended before a value was read")]
    MissingInput { what: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    /// A state conflict inside the engine. Never expected.
    #[error("simulation aborted: {0}")]
    Simulation(#[from] GraphError),

    #[error("failed to encode event: {0}")]
    Json(#[from] serde_json::Error),
}
