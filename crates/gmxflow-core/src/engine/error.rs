use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("GROMACS executable '{0}' not found. Install GROMACS or point gmxflow at the binary.")]
    ToolNotFound(String),

    #[error("Input structure file not found: {path}", path = path.display())]
    InputNotFound { path: PathBuf },

    #[error("Stage '{stage}' failed: 'gmx {subcommand}' exited with {status}")]
    StageFailed {
        stage: &'static str,
        subcommand: &'static str,
        status: ExitStatus,
    },

    #[error("Stage '{stage}' did not produce its declared output '{path}'", path = path.display())]
    MissingOutput { stage: &'static str, path: PathBuf },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
