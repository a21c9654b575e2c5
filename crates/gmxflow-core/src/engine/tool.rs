use crate::engine::error::PipelineError;
use crate::engine::stage::GmxInvocation;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Name of the GROMACS driver binary searched for on `PATH`.
pub const DEFAULT_BINARY: &str = "gmx";

/// Environment variable overriding the binary location.
pub const BINARY_ENV_VAR: &str = "GMXFLOW_GMX";

/// Handle to a located GROMACS installation.
///
/// Resolution order: explicit path from the configuration, then
/// [`BINARY_ENV_VAR`], then `gmx` on `PATH`. Resolution happens once, before
/// any pipeline work, so a missing installation aborts the run up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmxTool {
    binary: PathBuf,
}

impl GmxTool {
    pub fn locate(explicit: Option<&Path>) -> Result<Self, PipelineError> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(Self {
                    binary: path.to_path_buf(),
                });
            }
            return Err(PipelineError::ToolNotFound(path.display().to_string()));
        }

        if let Some(path) = env::var_os(BINARY_ENV_VAR) {
            let path = PathBuf::from(path);
            if path.is_file() {
                return Ok(Self { binary: path });
            }
            return Err(PipelineError::ToolNotFound(path.display().to_string()));
        }

        Self::find_on_path(DEFAULT_BINARY)
            .map(|binary| Self { binary })
            .ok_or_else(|| PipelineError::ToolNotFound(DEFAULT_BINARY.to_string()))
    }

    fn find_on_path(name: &str) -> Option<PathBuf> {
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Runs one `gmx` invocation inside `workdir`, blocking until it exits.
    ///
    /// Engine output is passed straight through to the inherited streams;
    /// a non-zero exit status aborts with the owning stage's name attached.
    pub fn run(
        &self,
        stage: &'static str,
        invocation: &GmxInvocation,
        workdir: &Path,
    ) -> Result<(), PipelineError> {
        info!(
            stage,
            subcommand = invocation.subcommand,
            "Invoking external engine"
        );
        debug!(args = ?invocation.args, stdin = ?invocation.stdin, "Invocation details");

        let mut command = Command::new(&self.binary);
        command
            .arg(invocation.subcommand)
            .args(&invocation.args)
            .current_dir(workdir);

        let status = match invocation.stdin {
            Some(input) => {
                command.stdin(Stdio::piped());
                let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;
                if let Some(mut stdin) = child.stdin.take() {
                    stdin
                        .write_all(input.as_bytes())
                        .map_err(|e| PipelineError::io("writing to engine stdin", e))?;
                }
                child
                    .wait()
                    .map_err(|e| PipelineError::io("waiting for engine process", e))?
            }
            None => command.status().map_err(|e| self.spawn_error(e))?,
        };

        if !status.success() {
            return Err(PipelineError::StageFailed {
                stage,
                subcommand: invocation.subcommand,
                status,
            });
        }
        Ok(())
    }

    fn spawn_error(&self, source: std::io::Error) -> PipelineError {
        if source.kind() == std::io::ErrorKind::NotFound {
            PipelineError::ToolNotFound(self.binary.display().to_string())
        } else {
            PipelineError::io("spawning engine process", source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(subcommand: &'static str) -> GmxInvocation {
        GmxInvocation::new(subcommand)
    }

    #[test]
    fn explicit_path_must_exist() {
        let missing = Path::new("/nonexistent/gmx");
        let err = GmxTool::locate(Some(missing)).unwrap_err();
        assert!(matches!(err, PipelineError::ToolNotFound(_)));
    }

    #[test]
    fn explicit_path_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("gmx");
        std::fs::write(&binary, "").unwrap();

        let tool = GmxTool::locate(Some(&binary)).unwrap();
        assert_eq!(tool.binary(), binary);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-gmx");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn zero_exit_is_success() {
            let dir = tempfile::tempdir().unwrap();
            let tool = GmxTool::locate(Some(&script(dir.path(), "exit 0"))).unwrap();
            tool.run("Topology", &invocation("pdb2gmx"), dir.path())
                .unwrap();
        }

        #[test]
        fn non_zero_exit_maps_to_stage_failure() {
            let dir = tempfile::tempdir().unwrap();
            let tool = GmxTool::locate(Some(&script(dir.path(), "exit 3"))).unwrap();

            let err = tool
                .run("Solvate", &invocation("solvate"), dir.path())
                .unwrap_err();
            match err {
                PipelineError::StageFailed {
                    stage, subcommand, ..
                } => {
                    assert_eq!(stage, "Solvate");
                    assert_eq!(subcommand, "solvate");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn stdin_payload_reaches_the_process() {
            let dir = tempfile::tempdir().unwrap();
            let tool = GmxTool::locate(Some(&script(dir.path(), "cat > selection.txt"))).unwrap();

            let inv = invocation("genion").with_stdin("SOL\n");
            tool.run("Ions", &inv, dir.path()).unwrap();

            let written = std::fs::read_to_string(dir.path().join("selection.txt")).unwrap();
            assert_eq!(written, "SOL\n");
        }
    }
}
