//! CLI-level error type.

use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced by the `hidra` binary.
#[derive(Error, Debug)]
pub enum CliError {
    /// Propagated from the engine's external mutation/query surface.
    #[error("engine error: {0}")]
    Engine(#[from] hidra_engine::EngineError),

    /// Propagated from the genome parser/compiler.
    #[error("genome error: {0}")]
    Gene(#[from] hidra_hgl::HglError),

    /// Propagated from the snapshot codec.
    #[error("storage error: {0}")]
    Storage(#[from] hidra_storage::StorageError),

    /// A workspace is malformed or missing required files.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// A `hidra.toml` document failed to parse.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command-line argument combination is invalid.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl CliError {
    /// Build a [`CliError::Workspace`].
    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    /// Build a [`CliError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CliError::InvalidArgs`].
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }
}
