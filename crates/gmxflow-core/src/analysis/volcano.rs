use super::error::AnalysisError;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Adjusted p-value below which a gene can be called significant.
pub const PADJ_CUTOFF: f64 = 0.05;

/// Absolute log2 fold-change a significant gene must exceed.
pub const LOG2FC_CUTOFF: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Significance {
    Upregulated,
    Downregulated,
    #[serde(rename = "Not Significant")]
    NotSignificant,
}

/// One row of the volcano table: the plotted coordinates plus the
/// significance call for a single gene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolcanoRow {
    pub gene: String,
    #[serde(rename = "log2FoldChange")]
    pub log2_fold_change: f64,
    #[serde(rename = "-log10(P_adj)")]
    pub neg_log10_padj: f64,
    #[serde(rename = "Significance")]
    pub significance: Significance,
}

pub fn classify(log2_fold_change: f64, padj: f64) -> Significance {
    if padj < PADJ_CUTOFF && log2_fold_change > LOG2FC_CUTOFF {
        Significance::Upregulated
    } else if padj < PADJ_CUTOFF && log2_fold_change < -LOG2FC_CUTOFF {
        Significance::Downregulated
    } else {
        Significance::NotSignificant
    }
}

/// Builds the volcano table from a differential-expression CSV whose first
/// column names the gene and which carries `log2FoldChange` and `padj`
/// columns. Rows where either value is missing or not a number are dropped.
pub fn volcano_table(path: &Path) -> Result<Vec<VolcanoRow>, AnalysisError> {
    let read_err = |source| AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(read_err)?;

    let headers = reader.headers().map_err(read_err)?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
    };
    let (fc_column, padj_column) = (column("log2FoldChange")?, column("padj")?);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let value = |column: usize| {
            record
                .get(column)
                .and_then(|v| v.trim().parse::<f64>().ok())
        };
        let (Some(log2_fold_change), Some(padj)) = (value(fc_column), value(padj_column)) else {
            continue;
        };

        // log10 of a negative adjusted p-value is NaN; those rows are
        // dropped, while padj == 0 keeps its infinite ordinate.
        let neg_log10_padj = -padj.log10();
        if log2_fold_change.is_nan() || neg_log10_padj.is_nan() {
            continue;
        }

        rows.push(VolcanoRow {
            gene: record.get(0).unwrap_or_default().to_string(),
            log2_fold_change,
            neg_log10_padj,
            significance: classify(log2_fold_change, padj),
        });
    }
    if rows.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }
    debug!(rows = rows.len(), "Built volcano table");
    Ok(rows)
}

pub fn write_table(rows: &[VolcanoRow], path: &Path) -> Result<(), AnalysisError> {
    let write_err = |source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    for row in rows {
        writer.serialize(row).map_err(write_err)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_respects_both_thresholds() {
        assert_eq!(classify(2.0, 0.01), Significance::Upregulated);
        assert_eq!(classify(-2.0, 0.01), Significance::Downregulated);
        assert_eq!(classify(0.5, 0.01), Significance::NotSignificant);
        assert_eq!(classify(2.0, 0.2), Significance::NotSignificant);
    }

    #[test]
    fn threshold_boundaries_are_exclusive() {
        assert_eq!(classify(1.0, 0.01), Significance::NotSignificant);
        assert_eq!(classify(-1.0, 0.01), Significance::NotSignificant);
        assert_eq!(classify(2.0, 0.05), Significance::NotSignificant);
    }

    #[test]
    fn table_drops_unusable_rows_and_keeps_infinite_ordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(
            &path,
            "gene,log2FoldChange,padj\n\
             up,2.5,0.001\n\
             broken,NA,0.001\n\
             zero,3.0,0.0\n\
             down,-2.5,0.001\n",
        )
        .unwrap();

        let rows = volcano_table(&path).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].gene, "up");
        assert_eq!(rows[0].significance, Significance::Upregulated);
        assert!((rows[0].neg_log10_padj - 3.0).abs() < 1e-12);

        assert_eq!(rows[1].gene, "zero");
        assert!(rows[1].neg_log10_padj.is_infinite());

        assert_eq!(rows[2].significance, Significance::Downregulated);
    }

    #[test]
    fn missing_columns_are_reported_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "gene,log2FoldChange\nup,2.5\n").unwrap();

        let err = volcano_table(&path).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingColumn(name) if name == "padj"));
    }

    #[test]
    fn table_with_no_usable_rows_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "gene,log2FoldChange,padj\nbroken,NA,NA\n").unwrap();

        assert!(matches!(volcano_table(&path), Err(AnalysisError::EmptyTable)));
    }

    #[test]
    fn written_table_uses_the_plotting_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("results.csv");
        std::fs::write(&input, "gene,log2FoldChange,padj\nup,2.5,0.001\n").unwrap();

        let output = dir.path().join("volcano.csv");
        write_table(&volcano_table(&input).unwrap(), &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("gene,log2FoldChange,-log10(P_adj),Significance\n"));
        assert!(content.contains("Upregulated"));
    }
}
