use super::error::AnalysisError;
use nalgebra::DMatrix;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Components kept when the caller does not ask for a specific count; the
/// effective count is always clamped to the matrix rank bound.
pub const DEFAULT_COMPONENTS: usize = 14;

/// A gene-expression matrix in the layout the upstream exporters produce:
/// row 0 holds sample identifiers, row 1 group labels, and every following
/// row one gene (name in column 0, one value per sample).
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionMatrix {
    pub sample_ids: Vec<String>,
    pub groups: Vec<String>,
    pub gene_names: Vec<String>,
    /// Genes by samples.
    values: DMatrix<f64>,
}

impl ExpressionMatrix {
    pub fn from_csv(path: &Path) -> Result<Self, AnalysisError> {
        let read_err = |source| AnalysisError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(read_err)?;

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;
        if records.len() < 3 {
            return Err(AnalysisError::TooFewRows {
                expected: 3,
                found: records.len(),
            });
        }

        let row_tail = |record: &csv::StringRecord| -> Vec<String> {
            record.iter().skip(1).map(str::to_string).collect()
        };
        let sample_ids = row_tail(&records[0]);
        let groups = row_tail(&records[1]);
        if sample_ids.is_empty() {
            return Err(AnalysisError::EmptyTable);
        }

        let samples = sample_ids.len();
        let genes = records.len() - 2;
        let mut gene_names = Vec::with_capacity(genes);
        let mut values = Vec::with_capacity(genes * samples);
        for (offset, record) in records[2..].iter().enumerate() {
            gene_names.push(record.get(0).unwrap_or_default().to_string());
            for cell in record.iter().skip(1) {
                let value: f64 =
                    cell.trim()
                        .parse()
                        .map_err(|_| AnalysisError::InvalidNumber {
                            row: offset + 3,
                            value: cell.to_string(),
                        })?;
                values.push(value);
            }
        }
        debug!(genes, samples, "Loaded expression matrix");

        Ok(Self {
            sample_ids,
            groups,
            gene_names,
            values: DMatrix::from_row_iterator(genes, samples, values),
        })
    }

    pub fn sample_count(&self) -> usize {
        self.values.ncols()
    }

    pub fn gene_count(&self) -> usize {
        self.values.nrows()
    }
}

/// Principal-component projection of the samples of an expression matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaResult {
    pub component_count: usize,
    /// Samples by components.
    pub coordinates: DMatrix<f64>,
    pub explained_variance_ratio: Vec<f64>,
}

/// Projects the samples onto their top principal components.
///
/// Samples become rows, each gene column is mean-centered, and the
/// projection comes from the thin SVD of the centered matrix. `requested`
/// is clamped to `min(samples, genes)`.
pub fn principal_components(
    matrix: &ExpressionMatrix,
    requested: usize,
) -> Result<PcaResult, AnalysisError> {
    if requested == 0 {
        return Err(AnalysisError::NoComponents);
    }

    let mut data = matrix.values.transpose();
    for column in 0..data.ncols() {
        let mean = data.column(column).mean();
        data.column_mut(column).add_scalar_mut(-mean);
    }

    let svd = data.svd(true, true);
    let u = svd.u.ok_or(AnalysisError::Decomposition)?;
    let singular_values = svd.singular_values;

    let component_count = requested
        .min(matrix.sample_count())
        .min(matrix.gene_count());
    let coordinates = DMatrix::from_fn(matrix.sample_count(), component_count, |row, col| {
        u[(row, col)] * singular_values[col]
    });

    let total_variance: f64 = singular_values.iter().map(|s| s * s).sum();
    let explained_variance_ratio = (0..component_count)
        .map(|i| {
            if total_variance > 0.0 {
                singular_values[i] * singular_values[i] / total_variance
            } else {
                0.0
            }
        })
        .collect();

    info!(component_count, "Computed principal components");
    Ok(PcaResult {
        component_count,
        coordinates,
        explained_variance_ratio,
    })
}

/// Writes per-sample coordinates, one row per sample with `PC1..PCn`
/// columns and an unnamed leading identifier column.
pub fn write_coordinates(
    result: &PcaResult,
    sample_ids: &[String],
    path: &Path,
) -> Result<(), AnalysisError> {
    let write_err = |source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;

    let mut header = vec![String::new()];
    header.extend((1..=result.component_count).map(|i| format!("PC{}", i)));
    writer.write_record(&header).map_err(write_err)?;

    for (row, sample_id) in sample_ids.iter().enumerate() {
        let mut record = vec![sample_id.clone()];
        record.extend(
            result
                .coordinates
                .row(row)
                .iter()
                .map(|value| value.to_string()),
        );
        writer.write_record(&record).map_err(write_err)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct VarianceRow {
    #[serde(rename = "Principal Component")]
    principal_component: String,
    #[serde(rename = "Explained Variance")]
    explained_variance: f64,
}

pub fn write_variance_ratios(result: &PcaResult, path: &Path) -> Result<(), AnalysisError> {
    let write_err = |source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    for (index, ratio) in result.explained_variance_ratio.iter().enumerate() {
        writer
            .serialize(VarianceRow {
                principal_component: format!("PC{}", index + 1),
                explained_variance: *ratio,
            })
            .map_err(write_err)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_matrix(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join("matrix.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    const COLLINEAR: &str = "\
,S1,S2,S3,S4
group,A,A,B,B
g1,1.0,2.0,3.0,4.0
g2,2.0,4.0,6.0,8.0
";

    #[test]
    fn parses_the_exported_matrix_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_matrix(dir.path(), COLLINEAR);

        let matrix = ExpressionMatrix::from_csv(&path).unwrap();
        assert_eq!(matrix.sample_ids, vec!["S1", "S2", "S3", "S4"]);
        assert_eq!(matrix.groups, vec!["A", "A", "B", "B"]);
        assert_eq!(matrix.gene_names, vec!["g1", "g2"]);
        assert_eq!(matrix.sample_count(), 4);
        assert_eq!(matrix.gene_count(), 2);
    }

    #[test]
    fn rejects_tables_without_data_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_matrix(dir.path(), ",S1,S2\ngroup,A,B\n");

        assert!(matches!(
            ExpressionMatrix::from_csv(&path),
            Err(AnalysisError::TooFewRows {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn reports_the_offending_cell_on_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_matrix(dir.path(), ",S1,S2\ngroup,A,B\ng1,1.0,oops\n");

        let err = ExpressionMatrix::from_csv(&path).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidNumber { row: 3, ref value } if value == "oops"
        ));
    }

    #[test]
    fn collinear_genes_collapse_onto_one_component() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = ExpressionMatrix::from_csv(&write_matrix(dir.path(), COLLINEAR)).unwrap();

        let result = principal_components(&matrix, DEFAULT_COMPONENTS).unwrap();
        // Rank bound: min(4 samples, 2 genes).
        assert_eq!(result.component_count, 2);
        assert_eq!(result.coordinates.nrows(), 4);

        assert!((result.explained_variance_ratio[0] - 1.0).abs() < 1e-9);
        assert!(result.explained_variance_ratio[1].abs() < 1e-9);

        let total: f64 = result.explained_variance_ratio.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn projection_preserves_sample_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = ExpressionMatrix::from_csv(&write_matrix(dir.path(), COLLINEAR)).unwrap();

        let result = principal_components(&matrix, 2).unwrap();
        let pc1: Vec<f64> = result.coordinates.column(0).iter().copied().collect();

        // Samples are evenly spaced along g1, so PC1 must be too.
        let gaps: Vec<f64> = pc1.windows(2).map(|w| w[1] - w[0]).collect();
        for gap in &gaps[1..] {
            assert!((gap - gaps[0]).abs() < 1e-9);
        }
    }

    #[test]
    fn constant_matrix_has_no_explained_variance() {
        let dir = tempfile::tempdir().unwrap();
        let content = ",S1,S2,S3\ngroup,A,A,B\ng1,5.0,5.0,5.0\ng2,7.0,7.0,7.0\n";
        let matrix = ExpressionMatrix::from_csv(&write_matrix(dir.path(), content)).unwrap();

        let result = principal_components(&matrix, 2).unwrap();
        assert!(result.explained_variance_ratio.iter().all(|r| *r == 0.0));
    }

    #[test]
    fn zero_components_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = ExpressionMatrix::from_csv(&write_matrix(dir.path(), COLLINEAR)).unwrap();
        assert!(matches!(
            principal_components(&matrix, 0),
            Err(AnalysisError::NoComponents)
        ));
    }

    #[test]
    fn coordinate_and_variance_tables_render_like_the_exports() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = ExpressionMatrix::from_csv(&write_matrix(dir.path(), COLLINEAR)).unwrap();
        let result = principal_components(&matrix, 2).unwrap();

        let coordinates = dir.path().join("pca_coordinates.csv");
        write_coordinates(&result, &matrix.sample_ids, &coordinates).unwrap();
        let content = std::fs::read_to_string(&coordinates).unwrap();
        assert!(content.starts_with(",PC1,PC2\nS1,"));
        assert_eq!(content.lines().count(), 5);

        let variances = dir.path().join("pca_variances.csv");
        write_variance_ratios(&result, &variances).unwrap();
        let content = std::fs::read_to_string(&variances).unwrap();
        assert!(content.starts_with("Principal Component,Explained Variance\nPC1,"));
        assert_eq!(content.lines().count(), 3);
    }
}
