use gmxflow::engine::error::PipelineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to read settings file '{path}': {source}", path = path.display())]
    SettingsFile {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
