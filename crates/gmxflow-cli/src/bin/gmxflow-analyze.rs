use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gmxflow::analysis::{cluster, pca, volcano};
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
    about = "gmxflow-analyze - Post-simulation data utilities: principal-component projection, k-means clustering, elbow scans, and volcano significance tables.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Project an expression matrix onto its principal components.
    Pca(PcaArgs),
    /// Cluster 3D embedding projections with k-means.
    Cluster(ClusterArgs),
    /// Scan a range of cluster counts and record the k-means inertia curve.
    Kscan(KscanArgs),
    /// Build a volcano significance table from differential-expression results.
    Volcano(VolcanoArgs),
}

#[derive(Args, Debug)]
struct PcaArgs {
    /// Headerless expression matrix CSV: sample ids, group labels, then one
    /// row per gene.
    #[arg(short, long, required = true, value_name = "PATH")]
    input: PathBuf,

    /// Directory for the generated tables.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Number of principal components to keep (clamped to the matrix rank).
    #[arg(short = 'n', long, value_name = "INT", default_value_t = pca::DEFAULT_COMPONENTS)]
    components: usize,
}

#[derive(Args, Debug)]
struct ClusterArgs {
    /// Embedding projection CSV with component_0..component_2 columns.
    #[arg(short, long, required = true, value_name = "PATH")]
    input: PathBuf,

    /// Number of clusters (acceptable range: 2-100).
    #[arg(short = 'k', long = "clusters", required = true, value_name = "INT")]
    clusters: usize,

    /// Path for the clustered table.
    #[arg(short, long, value_name = "PATH", default_value = "clustered_umap_3D_kmeans.csv")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct KscanArgs {
    /// Embedding projection CSV with component_0..component_2 columns.
    #[arg(short, long, required = true, value_name = "PATH")]
    input: PathBuf,

    /// Smallest cluster count to try.
    #[arg(long, value_name = "INT", default_value_t = 2)]
    kmin: usize,

    /// Largest cluster count to try.
    #[arg(long, value_name = "INT", default_value_t = 40)]
    kmax: usize,

    /// Path for the inertia curve table.
    #[arg(short, long, value_name = "PATH", default_value = "kmeans_elbow_values.csv")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct VolcanoArgs {
    /// Differential-expression CSV with log2FoldChange and padj columns.
    #[arg(short, long, required = true, value_name = "PATH")]
    input: PathBuf,

    /// Path for the volcano table. Defaults to the input name with a
    /// '_volcano.csv' suffix.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match Cli::parse().command {
        Commands::Pca(args) => run_pca(args),
        Commands::Cluster(args) => run_cluster(args),
        Commands::Kscan(args) => run_kscan(args),
        Commands::Volcano(args) => run_volcano(args),
    }
}

fn run_pca(args: PcaArgs) -> Result<()> {
    let matrix = pca::ExpressionMatrix::from_csv(&args.input)?;
    println!(
        "Loaded {} genes across {} samples.",
        matrix.gene_count(),
        matrix.sample_count()
    );

    let result = pca::principal_components(&matrix, args.components)?;

    let coordinates = args.output.join("pca_coordinates.csv");
    pca::write_coordinates(&result, &matrix.sample_ids, &coordinates)?;
    let variances = args.output.join("pca_variances.csv");
    pca::write_variance_ratios(&result, &variances)?;

    println!(
        "✅ Wrote {} components to {} and {}",
        result.component_count,
        coordinates.display(),
        variances.display()
    );
    Ok(())
}

fn run_cluster(args: ClusterArgs) -> Result<()> {
    let table = cluster::EmbeddingTable::from_csv(&args.input)?;
    let clustering = cluster::kmeans(table.points(), args.clusters)?;
    table.write_clustered(&clustering, &args.output)?;

    println!(
        "✅ Clustered {} points into {} clusters (inertia {:.4}): {}",
        table.points().len(),
        args.clusters,
        clustering.inertia,
        args.output.display()
    );
    Ok(())
}

fn run_kscan(args: KscanArgs) -> Result<()> {
    let table = cluster::EmbeddingTable::from_csv(&args.input)?;
    let curve = cluster::elbow_scan(table.points(), args.kmin, args.kmax)?;
    cluster::write_elbow(&curve, &args.output)?;

    println!(
        "✅ Scanned k = {}..={} over {} points: {}",
        args.kmin,
        args.kmax,
        table.points().len(),
        args.output.display()
    );
    Ok(())
}

fn run_volcano(args: VolcanoArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| default_volcano_output(&args.input));

    let rows = volcano::volcano_table(&args.input)?;
    let significant = rows
        .iter()
        .filter(|r| r.significance != volcano::Significance::NotSignificant)
        .count();
    volcano::write_table(&rows, &output)?;

    println!(
        "✅ Classified {} genes ({} significant): {}",
        rows.len(),
        significant,
        output.display()
    );
    Ok(())
}

fn default_volcano_output(input: &std::path::Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("volcano");
    input.with_file_name(format!("{}_volcano.csv", stem))
}
