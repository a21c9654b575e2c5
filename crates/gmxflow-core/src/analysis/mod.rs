//! Post-simulation data utilities: principal-component projection of
//! expression matrices, k-means clustering of 3D embedding projections,
//! elbow scans for cluster-count selection, and volcano significance tables.
//!
//! Each utility reads and writes CSV tables; figure rendering is left to
//! downstream plotting tools.

pub mod cluster;
pub mod error;
pub mod pca;
pub mod volcano;
