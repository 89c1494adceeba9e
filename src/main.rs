use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use census::core::{Catalog, FileScanner, Granularity, ScanConfig, TieBreakPolicy, UsageAnalyzer};
use census::formatters::{
    JsonReportFormatter, SummaryFormatter, REPORT_FILE_NAME, SUMMARY_FILE_NAME,
};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "census",
    version = "0.1.0",
    author = "census developers",
    about = "Inventory of dataframe API call sites in a Python codebase"
)]
struct Cli {
    /// Project directory to analyze
    #[arg(short, long, value_name = "PATH")]
    directory: PathBuf,

    /// API catalog (.json entries/listing, or .txt with one qualified name per line)
    #[arg(short = 'f', long, value_name = "FILE")]
    functions_file: PathBuf,

    /// Output directory for the report and summary
    #[arg(short, long, value_name = "DIR", default_value = "api_usage")]
    output_dir: PathBuf,

    /// Number of parallel workers
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Which same-name tie-break is tried first
    #[arg(long, value_enum, default_value_t = TieBreak::OwnerFirst)]
    tie_break: TieBreak,

    /// Redacted lines of context captured around each call
    #[arg(long, default_value_t = 0)]
    context_lines: usize,

    /// Summary grouping
    #[arg(long, value_enum, default_value_t = SummaryBy::Qualified)]
    summary_by: SummaryBy,

    /// Scan test directories and test files too
    #[arg(long)]
    include_tests: bool,

    /// Comma-separated extra directory names to skip
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    exclude: Vec<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum TieBreak {
    OwnerFirst,
    ArityFirst,
}

impl From<TieBreak> for TieBreakPolicy {
    fn from(value: TieBreak) -> Self {
        match value {
            TieBreak::OwnerFirst => TieBreakPolicy::OwnerFirst,
            TieBreak::ArityFirst => TieBreakPolicy::ArityFirst,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum SummaryBy {
    Qualified,
    Function,
}

impl From<SummaryBy> for Granularity {
    fn from(value: SummaryBy) -> Self {
        match value {
            SummaryBy::Qualified => Granularity::Qualified,
            SummaryBy::Function => Granularity::Function,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        directory,
        functions_file,
        output_dir,
        workers,
        tie_break,
        context_lines,
        summary_by,
        include_tests,
        exclude,
    } = cli;

    let start_time = Instant::now();

    println!("CENSUS - API usage inventory");
    println!("Input: {}", directory.display());
    println!("Catalog: {}", functions_file.display());
    println!("Output: {}", output_dir.display());

    let catalog = Catalog::load(&functions_file)
        .with_context(|| format!("loading catalog {}", functions_file.display()))?;
    println!("Catalog entries: {}", catalog.len());

    let config = ScanConfig::new()
        .with_workers(workers)
        .with_tie_break(tie_break.into())
        .with_context_lines(context_lines)
        .with_granularity(summary_by.into());
    let scanner = FileScanner::new()
        .with_excludes(exclude.into_iter().map(|name| name.trim().to_string()))
        .include_tests(include_tests);

    let outcome = UsageAnalyzer::new(&catalog)
        .with_config(config)
        .with_scanner(scanner)
        .analyze_directory(&directory)?;

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let report_path = output_dir.join(REPORT_FILE_NAME);
    let summary_path = output_dir.join(SUMMARY_FILE_NAME);
    JsonReportFormatter::new().format_to_file(&outcome.result, &report_path)?;
    SummaryFormatter::new().format_to_file(&outcome, &summary_path)?;

    println!(
        "Analyzed {} files ({} skipped), {} matches",
        outcome.result.total_files_analyzed,
        outcome.files_skipped(),
        outcome.result.total_matches
    );
    println!("Report: {}", report_path.display());
    println!("Summary: {}", summary_path.display());
    println!(
        "Total execution time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
