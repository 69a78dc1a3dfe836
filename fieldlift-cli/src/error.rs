//! CLI-specific error types and exit code mapping

use fieldlift_core::error::FieldliftError;
use fieldlift_promoter::PromoterError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Input stream could not be decoded.
    #[error("input error: {0}")]
    Input(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from fieldlift-core.
    #[error("{0}")]
    Core(#[from] FieldliftError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                    |
    /// |------|--------------------------------------------|
    /// | 0    | Success                                    |
    /// | 1    | General / command error                    |
    /// | 2    | Configuration error                        |
    /// | 3    | Input error (with `--fail-on-error`)       |
    /// | 10   | IO error                                   |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Input(_) => 3,
            Self::Io(_) => 10,
            Self::Core(FieldliftError::Config(_)) => 2,
            Self::Core(FieldliftError::Parse(_)) => 3,
            Self::Core(FieldliftError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<PromoterError> for CliError {
    fn from(e: PromoterError) -> Self {
        match e {
            PromoterError::Io(io) => Self::Io(io),
            e @ (PromoterError::Decode { .. } | PromoterError::LineTooLong { .. }) => {
                Self::Input(e.to_string())
            }
            e @ (PromoterError::InvalidPath { .. } | PromoterError::Config { .. }) => {
                Self::Config(e.to_string())
            }
            e @ PromoterError::Encode(_) => Self::Command(e.to_string()),
        }
    }
}
