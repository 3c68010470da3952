//! CLI entry point for fuzzy c-means imputation.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use fcm_imputation::io::{filled_output_path, load_table, write_table};
use fcm_imputation::{ClusterInit, ImputationConfig, ImputationReport, Imputer};
use std::path::Path;
use tracing::{debug, info};

/// CLI-compatible cluster initialization enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliClusterInit {
    /// Random membership matrix normalized per row
    RandomPartition,
    /// Distinct random rows as initial centers
    RandomSamples,
}

impl From<CliClusterInit> for ClusterInit {
    fn from(cli: CliClusterInit) -> Self {
        match cli {
            CliClusterInit::RandomPartition => ClusterInit::RandomPartition,
            CliClusterInit::RandomSamples => ClusterInit::RandomSamples,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Fuzzy C-Means imputation of missing numeric values",
    long_about = "Fills missing numeric cells of a CSV or Parquet table using fuzzy c-means \
                  clustering and reports accuracy on a random held-out share of observed cells.\n\n\
                  EXAMPLES:\n  \
                  # Impute with defaults, writing outputs/blood_sample_filled.csv\n  \
                  fcm-impute -i blood_sample.csv\n\n  \
                  # Three clusters, 20% held out, reproducible\n  \
                  fcm-impute -i blood_sample.csv --n-clusters 3 --test-fraction 0.2 --seed 42\n\n  \
                  # Skip evaluation and print a JSON report\n  \
                  fcm-impute -i blood_sample.csv --test-fraction 0 --json"
)]
struct Args {
    /// Path to the CSV or Parquet file to impute
    #[arg(short, long)]
    input: String,

    /// Output directory for the filled table
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Number of fuzzy clusters (must be less than the number of rows)
    #[arg(long, default_value = "5")]
    n_clusters: usize,

    /// Fuzziness exponent m (1.1 - 5.0)
    #[arg(short = 'm', long, default_value = "2.0")]
    fuzziness: f64,

    /// Fraction of observed cells per numeric column held out for evaluation
    ///
    /// Evaluation is skipped unless the value is strictly between 0 and 1
    #[arg(long, default_value = "0.1")]
    test_fraction: f64,

    /// Convergence tolerance on the membership change
    #[arg(long, default_value = "0.005")]
    tolerance: f64,

    /// Maximum optimizer iterations
    #[arg(long, default_value = "1000")]
    max_iterations: usize,

    /// Cluster initialization scheme
    #[arg(long, value_enum, default_value = "random-partition")]
    init: CliClusterInit,

    /// Seed for masking and clustering (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<ImputationConfig> {
    let mut builder = ImputationConfig::builder()
        .n_clusters(args.n_clusters)
        .fuzziness(args.fuzziness)
        .test_fraction(args.test_fraction)
        .tolerance(args.tolerance)
        .max_iterations(args.max_iterations)
        .init(args.init.into());

    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }

    Ok(builder.build()?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let input = Path::new(&args.input);
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;
    debug!("Configuration: {:?}", config);

    info!("Loading dataset from: {}", args.input);
    let data = load_table(input)?;
    let original_shape = data.shape();

    let imputer = Imputer::builder()
        .config(config)
        .on_progress(|update| {
            debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()?;

    let mut result = imputer.impute(data)?;

    let output_dir = Path::new(&args.output);
    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir)?;
        info!("Created output directory: {}", args.output);
    }
    let output_path = filled_output_path(input, output_dir);
    write_table(&mut result.data, &output_path)?;
    info!("Filled table saved: {}", output_path.display());

    let report = result.report(
        args.input.clone(),
        Some(output_path.to_string_lossy().into_owned()),
    );

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else if !args.quiet {
        print_human_readable_summary(&report, original_shape);
    }

    Ok(())
}

/// Print a human-readable summary of the imputation run.
fn print_human_readable_summary(report: &ImputationReport, original_shape: (usize, usize)) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("IMPUTATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, original_shape.0, original_shape.1
    );
    if let Some(ref output_file) = report.output_file {
        println!("Output: {}", output_file);
    }
    println!();

    println!("Clustering:");
    println!("  Clusters: {} (m = {})", summary.n_clusters, summary.fuzziness);
    println!(
        "  Iterations: {} ({})",
        summary.iterations,
        if summary.converged { "converged" } else { "iteration limit reached" }
    );
    if let Some(objective) = summary.final_objective {
        println!("  Objective: {:.4}", objective);
    }
    println!("  Partition Coefficient: {:.4}", summary.partition_coefficient);
    println!();

    println!("Imputation Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!("  Numeric Columns: {}", summary.numeric_columns.join(", "));
    println!("  Missing Cells: {}", summary.cells_missing);
    println!("  Held-Out Cells: {}", summary.cells_held_out);
    println!(
        "  Filled: {} from clusters, {} by fallback",
        summary.cells_filled_from_clusters, summary.cells_filled_by_fallback
    );
    println!();

    match report.evaluation {
        Some(evaluation) => {
            println!("Evaluation ({} held-out cells):", evaluation.n_test);
            println!("  MAE:  {:.4}", evaluation.mae);
            println!("  RMSE: {:.4}", evaluation.rmse);
        }
        None => println!("Evaluation: skipped (test fraction outside (0, 1))"),
    }
    println!();

    if let Some(ref warning) = report.warning {
        println!("Warnings:");
        println!("  ! {}", warning);
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
