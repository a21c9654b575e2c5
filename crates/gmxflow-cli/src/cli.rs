use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "gmxflow - Automates a complete GROMACS molecular-dynamics pipeline: topology, solvation, ions, minimization, equilibration, and production.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Path to the input structure file (e.g., protein.pdb).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory where all pipeline outputs are written. Created if absent.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Simulation duration as '<number><unit>' with unit ns, ps, us, or ms.
    /// Defaults to 10ns when neither this flag nor a settings file sets it.
    #[arg(short, long, value_name = "DURATION")]
    pub time: Option<String>,

    /// Path to an optional TOML settings file for protocol overrides.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the GROMACS executable. Defaults to 'gmx' on PATH
    /// (or the GMXFLOW_GMX environment variable when set).
    #[arg(long, value_name = "PATH")]
    pub gmx: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
