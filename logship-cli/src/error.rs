//! CLI-specific error types and exit code mapping

use logship_core::error::{LogshipError, SourceError};
use logship_pipeline::{ErrorClass, LogPipelineError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to the documented process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid combination of command-line arguments.
    #[error("invalid arguments: {0}")]
    Usage(String),

    /// Configuration value rejected outside of the core validator.
    #[error("configuration error: {0}")]
    Config(String),

    /// Process setup failed (logging, metrics exporter, signal handlers).
    #[error("setup failed: {0}")]
    Setup(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logship-core.
    #[error("{0}")]
    Core(#[from] LogshipError),

    /// Wrapped domain error from logship-pipeline.
    #[error("{0}")]
    Pipeline(#[from] LogPipelineError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Success / normal shutdown                 |
    /// | 1    | Runtime failure (read error, sink, setup) |
    /// | 2    | Invalid arguments                         |
    /// | 3    | Invalid or missing pattern                |
    /// | 4    | Line source could not be opened           |
    /// | 5    | Configuration error                       |
    /// | 6    | Document serialization failure            |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Config(_) => 5,
            Self::Core(LogshipError::Config(_)) => 5,
            Self::Core(LogshipError::Source(SourceError::Open { .. })) => 4,
            Self::Pipeline(e) => match e.class() {
                ErrorClass::Pattern => 3,
                ErrorClass::SourceOpen => 4,
                ErrorClass::Configuration => 5,
                ErrorClass::Internal => 6,
                ErrorClass::Runtime => 1,
            },
            Self::Setup(_) | Self::JsonSerialize(_) | Self::Io(_) | Self::Core(_) => 1,
        }
    }
}
