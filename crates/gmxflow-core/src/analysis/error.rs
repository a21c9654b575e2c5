use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column '{0}' in input table")]
    MissingColumn(String),

    #[error("No usable rows left in the input table after filtering")]
    EmptyTable,

    #[error("Expression matrix needs at least {expected} rows (ids, groups, data), found {found}")]
    TooFewRows { expected: usize, found: usize },

    #[error("Row {row}: invalid numeric value '{value}'")]
    InvalidNumber { row: usize, value: String },

    #[error("Cluster count {0} out of range; expected 2 to 100")]
    ClusterCountOutOfRange(usize),

    #[error("Cannot form {clusters} clusters from {points} points")]
    TooFewPoints { points: usize, clusters: usize },

    #[error("Invalid cluster range: kmin {kmin} exceeds kmax {kmax}")]
    InvalidClusterRange { kmin: usize, kmax: usize },

    #[error("Component count must be at least 1")]
    NoComponents,

    #[error("Singular value decomposition failed on the centered matrix")]
    Decomposition,
}
