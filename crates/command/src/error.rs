use std::path::PathBuf;

/// Errors raised while configuring a command.
///
/// Execution outcomes are not errors: `execute` reports them through its
/// boolean result and the accessors of
/// [`ExecutionResult`](crate::ExecutionResult).
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("No command given")]
    NotConfigured,
    #[error("No output sink configured")]
    NoOutputSink,
    #[error("Unknown option '{0}'")]
    UnknownOption(String),
    #[error("Invalid value '{value}' for option '{key}'")]
    InvalidSetting { key: String, value: String },
    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
    #[error("Failed to locate config directory: {0}")]
    ConfigLocation(String),
}
