use crate::engine::config::SimulationConfig;

/// Group selected when `genion` asks which molecules to replace with ions.
const SOLVENT_GROUP: &str = "SOL\n";

/// One call to the external `gmx` driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmxInvocation {
    pub subcommand: &'static str,
    pub args: Vec<String>,
    /// Text piped to the process when the subcommand prompts interactively.
    pub stdin: Option<&'static str>,
}

impl GmxInvocation {
    pub fn new(subcommand: &'static str) -> Self {
        Self {
            subcommand,
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn with_stdin(mut self, input: &'static str) -> Self {
        self.stdin = Some(input);
        self
    }
}

/// One pipeline stage: a short name for reporting, the `gmx` calls it makes,
/// and the output file (relative to the run directory) that must exist for
/// the next stage to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub description: &'static str,
    pub invocations: Vec<GmxInvocation>,
    pub output: &'static str,
}

/// Builds the fixed eight-stage pipeline for `config`.
///
/// `input_file` is the name of the structure file inside the run directory;
/// every path in the generated argument lists is relative to that directory.
pub fn pipeline(config: &SimulationConfig, input_file: &str) -> Vec<Stage> {
    vec![
        Stage {
            name: "Topology",
            description: "Generating topology from the input structure",
            invocations: vec![
                GmxInvocation::new("pdb2gmx")
                    .arg("-f")
                    .arg(input_file)
                    .arg("-o")
                    .arg("processed.gro")
                    .arg("-p")
                    .arg("topol.top")
                    .arg("-ff")
                    .arg(&config.force_field)
                    .arg("-water")
                    .arg(&config.water_model)
                    .arg("-ignh"),
            ],
            output: "processed.gro",
        },
        Stage {
            name: "Box",
            description: "Centering the solute in a cubic box",
            invocations: vec![
                GmxInvocation::new("editconf")
                    .arg("-f")
                    .arg("processed.gro")
                    .arg("-o")
                    .arg("boxed.gro")
                    .arg("-c")
                    .arg("-d")
                    .arg(config.box_distance.to_string())
                    .arg("-bt")
                    .arg("cubic"),
            ],
            output: "boxed.gro",
        },
        Stage {
            name: "Solvate",
            description: "Filling the box with water",
            invocations: vec![
                GmxInvocation::new("solvate")
                    .arg("-cp")
                    .arg("boxed.gro")
                    .arg("-cs")
                    .arg("spc216.gro")
                    .arg("-o")
                    .arg("solvated.gro")
                    .arg("-p")
                    .arg("topol.top"),
            ],
            output: "solvated.gro",
        },
        Stage {
            name: "Ions",
            description: "Replacing solvent with neutralizing ions",
            invocations: vec![
                grompp("ions.mdp", "solvated.gro", "ions.tpr").arg("-maxwarn").arg("1"),
                GmxInvocation::new("genion")
                    .arg("-s")
                    .arg("ions.tpr")
                    .arg("-o")
                    .arg("ionized.gro")
                    .arg("-p")
                    .arg("topol.top")
                    .arg("-pname")
                    .arg(&config.positive_ion)
                    .arg("-nname")
                    .arg(&config.negative_ion)
                    .arg("-neutral")
                    .with_stdin(SOLVENT_GROUP),
            ],
            output: "ionized.gro",
        },
        Stage {
            name: "Minimize",
            description: "Relaxing the system by steepest descent",
            invocations: vec![
                grompp("minim.mdp", "ionized.gro", "em.tpr"),
                mdrun("em"),
            ],
            output: "em.gro",
        },
        Stage {
            name: "NVT",
            description: "Equilibrating temperature at constant volume",
            invocations: vec![
                grompp("nvt.mdp", "em.gro", "nvt.tpr").arg("-r").arg("em.gro"),
                mdrun("nvt"),
            ],
            output: "nvt.gro",
        },
        Stage {
            name: "NPT",
            description: "Equilibrating pressure at constant temperature",
            invocations: vec![
                grompp("npt.mdp", "nvt.gro", "npt.tpr")
                    .arg("-r")
                    .arg("nvt.gro")
                    .arg("-t")
                    .arg("nvt.cpt"),
                mdrun("npt"),
            ],
            output: "npt.gro",
        },
        Stage {
            name: "Production",
            description: "Running production dynamics",
            invocations: vec![
                grompp("md.mdp", "npt.gro", "md.tpr").arg("-t").arg("npt.cpt"),
                mdrun("md"),
            ],
            output: "md.gro",
        },
    ]
}

fn grompp(mdp: &'static str, coordinates: &'static str, output: &'static str) -> GmxInvocation {
    GmxInvocation::new("grompp")
        .arg("-f")
        .arg(mdp)
        .arg("-c")
        .arg(coordinates)
        .arg("-p")
        .arg("topol.top")
        .arg("-o")
        .arg(output)
}

fn mdrun(prefix: &'static str) -> GmxInvocation {
    GmxInvocation::new("mdrun").arg("-deffnm").arg(prefix)
}
