use super::error::AnalysisError;
use nalgebra::Point3;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

pub const MIN_CLUSTERS: usize = 2;
pub const MAX_CLUSTERS: usize = 100;

const MAX_ITERATIONS: usize = 100;

/// Result of one k-means run: per-point cluster assignments, the final
/// centroids, and the within-cluster sum of squared distances (inertia).
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub assignments: Vec<usize>,
    pub centroids: Vec<Point3<f64>>,
    pub inertia: f64,
}

/// One entry of an elbow scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
}

/// A 3D embedding projection table (`component_0..component_2` plus any
/// identifier columns), with rows lacking finite coordinates dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    points: Vec<Point3<f64>>,
}

impl EmbeddingTable {
    pub fn from_csv(path: &Path) -> Result<Self, AnalysisError> {
        let read_err = |source| AnalysisError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(read_err)?;

        let mut headers: Vec<String> =
            reader.headers().map_err(read_err)?.iter().map(str::to_string).collect();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
        };
        let (cx, cy, cz) = (
            column("component_0")?,
            column("component_1")?,
            column("component_2")?,
        );

        let mut rows = Vec::new();
        let mut points = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            let coordinate = |column: usize| {
                record
                    .get(column)
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
            };
            let (Some(x), Some(y), Some(z)) = (coordinate(cx), coordinate(cy), coordinate(cz))
            else {
                continue;
            };
            rows.push(record.iter().map(str::to_string).collect());
            points.push(Point3::new(x, y, z));
        }
        if points.is_empty() {
            return Err(AnalysisError::EmptyTable);
        }
        debug!(rows = points.len(), "Loaded embedding projections");

        // Coordinate columns are exposed as x/y/z in every generated table.
        headers[cx] = "x".to_string();
        headers[cy] = "y".to_string();
        headers[cz] = "z".to_string();

        Ok(Self {
            headers,
            rows,
            points,
        })
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Writes the table with a trailing `cluster` column appended.
    pub fn write_clustered(
        &self,
        clustering: &Clustering,
        path: &Path,
    ) -> Result<(), AnalysisError> {
        let write_err = |source| AnalysisError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(write_err)?;

        let mut header = self.headers.clone();
        header.push("cluster".to_string());
        writer.write_record(&header).map_err(write_err)?;

        for (row, cluster) in self.rows.iter().zip(&clustering.assignments) {
            let mut record = row.clone();
            record.push(cluster.to_string());
            writer.write_record(&record).map_err(write_err)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Lloyd's algorithm with deterministic, evenly spaced seeding so repeated
/// runs over the same table agree.
pub fn kmeans(points: &[Point3<f64>], k: usize) -> Result<Clustering, AnalysisError> {
    if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&k) {
        return Err(AnalysisError::ClusterCountOutOfRange(k));
    }
    if points.len() < k {
        return Err(AnalysisError::TooFewPoints {
            points: points.len(),
            clusters: k,
        });
    }

    let mut centroids: Vec<Point3<f64>> =
        (0..k).map(|i| points[i * points.len() / k]).collect();
    let mut assignments = vec![0usize; points.len()];

    for iteration in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (point, assignment) in points.iter().zip(assignments.iter_mut()) {
            let nearest = nearest_centroid(point, &centroids);
            if nearest != *assignment {
                *assignment = nearest;
                changed = true;
            }
        }
        if iteration > 0 && !changed {
            break;
        }

        let mut sums = vec![Point3::origin(); k];
        let mut counts = vec![0usize; k];
        for (point, &assignment) in points.iter().zip(&assignments) {
            sums[assignment].coords += point.coords;
            counts[assignment] += 1;
        }
        for (centroid, (sum, count)) in centroids.iter_mut().zip(sums.iter().zip(&counts)) {
            // An emptied cluster keeps its previous centroid.
            if *count > 0 {
                centroid.coords = sum.coords / *count as f64;
            }
        }
    }

    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(point, &assignment)| (point - centroids[assignment]).norm_squared())
        .sum();
    info!(k, inertia, "k-means converged");

    Ok(Clustering {
        assignments,
        centroids,
        inertia,
    })
}

/// Runs k-means for every k in `kmin..=kmax` and records the inertia curve.
pub fn elbow_scan(
    points: &[Point3<f64>],
    kmin: usize,
    kmax: usize,
) -> Result<Vec<ElbowPoint>, AnalysisError> {
    if kmin > kmax {
        return Err(AnalysisError::InvalidClusterRange { kmin, kmax });
    }
    (kmin..=kmax)
        .map(|k| {
            kmeans(points, k).map(|clustering| ElbowPoint {
                k,
                inertia: clustering.inertia,
            })
        })
        .collect()
}

pub fn write_elbow(curve: &[ElbowPoint], path: &Path) -> Result<(), AnalysisError> {
    let write_err = |source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    for point in curve {
        writer.serialize(point).map_err(write_err)?;
    }
    writer.flush()?;
    Ok(())
}

fn nearest_centroid(point: &Point3<f64>, centroids: &[Point3<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = (point - centroid).norm_squared();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}
