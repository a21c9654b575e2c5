use crate::core::params;
use crate::engine::config::SimulationConfig;
use crate::engine::error::PipelineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::stage;
use crate::engine::tool::GmxTool;
use std::fs;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Summary of a completed pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub nanoseconds: f64,
    pub production_steps: u64,
    pub stages_run: usize,
    /// Final structure written by the production run.
    pub final_structure: PathBuf,
}

/// Runs the complete eight-stage pipeline described by `config`.
///
/// Blocking; each external process finishes before the next starts, and the
/// first failure (non-zero exit or missing declared output) aborts the run.
#[instrument(skip_all, name = "simulation_pipeline")]
pub fn run(
    config: &SimulationConfig,
    reporter: &ProgressReporter,
) -> Result<SimulationReport, PipelineError> {
    // === Phase 0: Validate inputs and locate the engine ===
    if !config.input.is_file() {
        return Err(PipelineError::InputNotFound {
            path: config.input.clone(),
        });
    }
    let tool = GmxTool::locate(config.gmx_binary.as_deref())?;
    info!(binary = %tool.binary().display(), "Located GROMACS engine");

    // === Phase 1: Prepare the run directory ===
    fs::create_dir_all(&config.output_dir)
        .map_err(|e| PipelineError::io("creating output directory", e))?;

    let input_file = config
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::InputNotFound {
            path: config.input.clone(),
        })?;
    fs::copy(&config.input, config.output_dir.join(&input_file))
        .map_err(|e| PipelineError::io("copying input structure", e))?;
    info!(file = %input_file, "Copied input structure into the run directory");

    // === Phase 2: Generate run parameters ===
    let steps = config.time.production_steps();
    info!(
        duration = %config.time,
        nanoseconds = config.time.as_nanoseconds(),
        steps,
        "Derived production step count"
    );

    let documents = params::pipeline_documents(steps, &config.ensemble);
    for document in &documents {
        document
            .write_to_dir(&config.output_dir)
            .map_err(|e| PipelineError::io(format!("writing {}", document.file_name()), e))?;
    }
    reporter.report(Progress::Message(format!(
        "Wrote {} parameter files",
        documents.len()
    )));

    // === Phase 3: Execute the stages in order ===
    let stages = stage::pipeline(config, &input_file);
    let total = stages.len();
    reporter.report(Progress::PipelineStart {
        total_stages: total,
    });

    for (index, stage) in stages.iter().enumerate() {
        reporter.report(Progress::StageStart {
            index,
            total,
            name: stage.name,
            description: stage.description,
        });
        info!(stage = stage.name, "{}", stage.description);

        for invocation in &stage.invocations {
            tool.run(stage.name, invocation, &config.output_dir)?;
        }

        let declared = config.output_dir.join(stage.output);
        if !declared.is_file() {
            return Err(PipelineError::MissingOutput {
                stage: stage.name,
                path: declared,
            });
        }
        reporter.report(Progress::StageFinish { name: stage.name });
    }

    reporter.report(Progress::PipelineFinish);
    info!("Pipeline complete");

    Ok(SimulationReport {
        nanoseconds: config.time.as_nanoseconds(),
        production_steps: steps,
        stages_run: total,
        final_structure: config.output_dir.join("md.gro"),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::engine::config::SimulationConfigBuilder;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::sync::Mutex;

    /// Stand-in for `gmx`: touches whatever output the arguments declare
    /// (`-o`, `-p`, `-deffnm` prefix files) and exits 0.
    const STUB_ENGINE: &str = r#"#!/bin/sh
prev=""
for a in "$@"; do
    case "$prev" in
        -o) : > "$a" ;;
        -p) : > "$a" ;;
        -deffnm) : > "$a.gro"; : > "$a.cpt" ;;
    esac
    prev="$a"
done
exit 0
"#;

    fn write_stub(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("gmx-stub");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config_for(dir: &Path, stub: PathBuf, time: &str) -> SimulationConfig {
        let input = dir.join("protein.pdb");
        std::fs::write(&input, "ATOM      1  N   LYS A   1\n").unwrap();

        SimulationConfigBuilder::new()
            .input(input)
            .output_dir(dir.join("run"))
            .time(time.parse().unwrap())
            .gmx_binary(stub)
            .build()
            .unwrap()
    }

    #[test]
    fn pipeline_runs_all_stages_against_a_stub_engine() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path(), STUB_ENGINE);
        let config = config_for(dir.path(), stub, "1ns");

        let stages_seen: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StageFinish { name } = event {
                stages_seen.lock().unwrap().push(name);
            }
        }));

        let report = run(&config, &reporter).unwrap();
        assert_eq!(report.stages_run, 8);
        assert_eq!(report.production_steps, 500_000);
        assert_eq!(report.nanoseconds, 1.0);

        let run_dir = config.output_dir;
        assert!(run_dir.join("protein.pdb").is_file());
        for mdp in ["ions.mdp", "minim.mdp", "nvt.mdp", "npt.mdp", "md.mdp"] {
            assert!(run_dir.join(mdp).is_file(), "{mdp} missing");
        }
        assert!(run_dir.join("md.gro").is_file());

        assert_eq!(
            *stages_seen.lock().unwrap(),
            vec![
                "Topology",
                "Box",
                "Solvate",
                "Ions",
                "Minimize",
                "NVT",
                "NPT",
                "Production"
            ]
        );
    }

    #[test]
    fn failing_engine_aborts_on_the_first_stage() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path(), "#!/bin/sh\nexit 1\n");
        let config = config_for(dir.path(), stub, "10ns");

        let err = run(&config, &ProgressReporter::new()).unwrap_err();
        match err {
            PipelineError::StageFailed { stage, .. } => assert_eq!(stage, "Topology"),
            other => panic!("unexpected error: {other}"),
        }

        // Fail-fast: the parameter files were written, nothing else was.
        assert!(config.output_dir.join("ions.mdp").is_file());
        assert!(!config.output_dir.join("processed.gro").exists());
    }

    #[test]
    fn silent_success_without_declared_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path(), "#!/bin/sh\nexit 0\n");
        let config = config_for(dir.path(), stub, "10ns");

        let err = run(&config, &ProgressReporter::new()).unwrap_err();
        match err {
            PipelineError::MissingOutput { stage, path } => {
                assert_eq!(stage, "Topology");
                assert!(path.ends_with("processed.gro"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_input_structure_is_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path(), STUB_ENGINE);

        let config = SimulationConfigBuilder::new()
            .input(dir.path().join("absent.pdb"))
            .output_dir(dir.path().join("run"))
            .time("10ns".parse().unwrap())
            .gmx_binary(stub)
            .build()
            .unwrap();

        let err = run(&config, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound { .. }));
        assert!(!config.output_dir.exists());
    }
}
