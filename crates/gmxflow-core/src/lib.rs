//! # gmxflow Core Library
//!
//! A library for driving a complete GROMACS molecular-dynamics pipeline —
//! topology generation, solvation, ion addition, energy minimization,
//! two-stage equilibration, and a production run — from a single structure
//! file and a requested simulation duration, plus the data utilities used
//! downstream of the runs.
//!
//! ## Architectural Philosophy
//!
//! The library is split into four layers.
//!
//! - **[`core`]: The Foundation.** Pure, process-free building blocks:
//!   simulation-duration parsing and normalization (`time`) and the
//!   generated `.mdp` parameter documents (`params`).
//!
//! - **[`engine`]: The Execution Core.** Everything that touches the outside
//!   world: pipeline configuration, the stage definitions, locating and
//!   spawning the external `gmx` executable, and progress reporting.
//!
//! - **[`workflows`]: The Pipeline API.** The user-facing entry point that
//!   ties `core` and `engine` together into the fixed eight-stage pipeline.
//!
//! - **[`analysis`]: The Data Utilities.** CSV-to-CSV companions to the
//!   pipeline: principal-component projection, k-means clustering and elbow
//!   scans of embedding projections, and volcano significance tables.

pub mod analysis;
pub mod core;
pub mod engine;
pub mod workflows;
