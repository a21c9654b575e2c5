use crate::core::time::TIMESTEP_PS;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Number of steps for each equilibration phase (100 ps at a 2 fs timestep).
const EQUILIBRATION_STEPS: u64 = 50_000;

/// A generated GROMACS run-parameter (`.mdp`) document.
///
/// Parameters are kept as an ordered list so the rendered file reads in the
/// order the preset defines them, matching hand-written `.mdp` convention.
#[derive(Debug, Clone, PartialEq)]
pub struct MdpDocument {
    file_name: &'static str,
    title: &'static str,
    entries: Vec<(&'static str, String)>,
}

impl MdpDocument {
    fn new(file_name: &'static str, title: &'static str) -> Self {
        Self {
            file_name,
            title,
            entries: Vec::new(),
        }
    }

    fn set(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.entries.push((key, value.to_string()));
        self
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn render(&self) -> String {
        let mut out = format!("; {}\n", self.title);
        for (key, value) in &self.entries {
            out.push_str(&format!("{:<24}= {}\n", key, value));
        }
        out
    }

    /// Writes the document into `dir` under its preset file name.
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(self.file_name);
        fs::write(&path, self.render())?;
        Ok(path)
    }
}

/// Run parameters shared by the presets that thermostat or barostat couple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleSettings {
    /// Thermostat reference temperature, in Kelvin.
    pub temperature: f64,
    /// Barostat reference pressure, in bar.
    pub pressure: f64,
}

/// Steepest-descent parameters used only to assemble the `genion` run input.
pub fn ions() -> MdpDocument {
    MdpDocument::new("ions.mdp", "Ion placement parameters")
        .set("integrator", "steep")
        .set("emtol", "1000.0")
        .set("emstep", "0.01")
        .set("nsteps", 50_000)
        .set("nstlist", 1)
        .set("cutoff-scheme", "Verlet")
        .set("coulombtype", "cutoff")
        .set("rcoulomb", "1.0")
        .set("rvdw", "1.0")
        .set("pbc", "xyz")
}

/// Steepest-descent energy minimization.
pub fn minimization() -> MdpDocument {
    MdpDocument::new("minim.mdp", "Energy minimization parameters")
        .set("integrator", "steep")
        .set("emtol", "1000.0")
        .set("emstep", "0.01")
        .set("nsteps", 50_000)
        .set("nstlist", 1)
        .set("cutoff-scheme", "Verlet")
        .set("coulombtype", "PME")
        .set("rcoulomb", "1.0")
        .set("rvdw", "1.0")
        .set("pbc", "xyz")
}

/// Constant-volume equilibration with position restraints and fresh
/// Maxwell-Boltzmann velocities.
pub fn nvt_equilibration(ensemble: &EnsembleSettings) -> MdpDocument {
    leapfrog("nvt.mdp", "NVT equilibration parameters", ensemble)
        .set("define", "-DPOSRES")
        .set("nsteps", EQUILIBRATION_STEPS)
        .set("continuation", "no")
        .set("gen_vel", "yes")
        .set("gen_temp", ensemble.temperature)
        .set("gen_seed", -1)
        .set("pcoupl", "no")
}

/// Constant-pressure equilibration continuing from the NVT checkpoint.
pub fn npt_equilibration(ensemble: &EnsembleSettings) -> MdpDocument {
    leapfrog("npt.mdp", "NPT equilibration parameters", ensemble)
        .set("define", "-DPOSRES")
        .set("nsteps", EQUILIBRATION_STEPS)
        .set("continuation", "yes")
        .set("gen_vel", "no")
        .set("pcoupl", "Parrinello-Rahman")
        .set("pcoupltype", "isotropic")
        .set("tau_p", "2.0")
        .set("ref_p", ensemble.pressure)
        .set("compressibility", "4.5e-5")
        .set("refcoord_scaling", "com")
}

/// Unrestrained production run; `steps` comes from the requested duration.
pub fn production(steps: u64, ensemble: &EnsembleSettings) -> MdpDocument {
    leapfrog("md.mdp", "Production run parameters", ensemble)
        .set("nsteps", steps)
        .set("continuation", "yes")
        .set("gen_vel", "no")
        .set("nstxout-compressed", 5_000)
        .set("pcoupl", "Parrinello-Rahman")
        .set("pcoupltype", "isotropic")
        .set("tau_p", "2.0")
        .set("ref_p", ensemble.pressure)
        .set("compressibility", "4.5e-5")
}

/// All five documents the pipeline writes before its first `grompp` call.
pub fn pipeline_documents(production_steps: u64, ensemble: &EnsembleSettings) -> Vec<MdpDocument> {
    vec![
        ions(),
        minimization(),
        nvt_equilibration(ensemble),
        npt_equilibration(ensemble),
        production(production_steps, ensemble),
    ]
}

/// Shared leap-frog dynamics block: output control, constraints, PME
/// electrostatics, and V-rescale temperature coupling.
fn leapfrog(
    file_name: &'static str,
    title: &'static str,
    ensemble: &EnsembleSettings,
) -> MdpDocument {
    MdpDocument::new(file_name, title)
        .set("integrator", "md")
        .set("dt", TIMESTEP_PS)
        .set("nstenergy", 500)
        .set("nstlog", 500)
        .set("constraint_algorithm", "lincs")
        .set("constraints", "h-bonds")
        .set("lincs_iter", 1)
        .set("lincs_order", 4)
        .set("cutoff-scheme", "Verlet")
        .set("nstlist", 10)
        .set("rcoulomb", "1.0")
        .set("rvdw", "1.0")
        .set("coulombtype", "PME")
        .set("pme_order", 4)
        .set("fourierspacing", "0.16")
        .set("tcoupl", "V-rescale")
        .set("tc-grps", "Protein Non-Protein")
        .set("tau_t", "0.1 0.1")
        .set("ref_t", format!("{0} {0}", ensemble.temperature))
        .set("DispCorr", "EnerPres")
        .set("pbc", "xyz")
}
