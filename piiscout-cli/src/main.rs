use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use itertools::Itertools;
use piiscout::{
    read_file, Catalog, Category, CategoryKind, CliOverrides, MalformedLinePolicy, ScanConfig,
    ScanResult, ScanStats, Scanner,
};
use std::{num::NonZeroUsize, path::PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;

use report::{ReportFormat, ReportWriter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliScanArgs {
    /// Line-oriented text file to scan
    input: PathBuf,

    /// Directory that receives the per-category reports
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Number of lines handed to a worker at a time
    #[arg(short = 'c', long)]
    chunk_size: Option<NonZeroUsize>,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Only scan these categories (e.g. PAN,Email,IP)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<Category>,

    /// Skip lines that are not valid UTF-8 instead of aborting
    #[arg(long)]
    skip_malformed: bool,

    /// Abort on lines that are not valid UTF-8, even if the config says skip
    #[arg(long, conflicts_with = "skip_malformed")]
    abort_malformed: bool,

    /// Report file format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Number of records per report file
    #[arg(long)]
    batch_size: Option<NonZeroUsize>,

    /// Show only the summary, do not write reports
    #[arg(short, long)]
    stats: bool,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl CliScanArgs {
    /// Values given on the command line
    fn overrides(&self) -> CliOverrides {
        let malformed_lines = if self.skip_malformed {
            Some(MalformedLinePolicy::Skip)
        } else if self.abort_malformed {
            Some(MalformedLinePolicy::Abort)
        } else {
            None
        };
        CliOverrides {
            chunk_size: self.chunk_size,
            thread_count: self.threads,
            malformed_lines,
            categories: (!self.categories.is_empty()).then(|| self.categories.clone()),
            output_dir: self.output.clone(),
            report_batch_size: self.batch_size,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a file for personally identifiable information
    Scan(Box<CliScanArgs>),

    /// List the detectable categories
    Categories,
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            let config = ScanConfig::load_from(args.config.as_deref())
                .context("Failed to load configuration")?
                .merge_with_cli(args.overrides());
            init_logging(&config.log_level);

            let scanner = Scanner::new(&config)?;
            let input = read_file(&args.input, config.malformed_lines)
                .with_context(|| format!("Failed to read {}", args.input.display()))?;
            let (result, stats) = scanner.scan_with_stats(&input)?;

            if !args.stats {
                let writer =
                    ReportWriter::new(&config.output_dir, args.format, config.report_batch_size);
                let written = writer.write(&result)?;
                info!(
                    "Wrote {} report files to {}",
                    written.len(),
                    config.output_dir.display()
                );
            }

            print_summary(&result, &stats);
            Ok(())
        }
        Commands::Categories => {
            print_categories(&*Catalog::shared()?);
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_summary(result: &ScanResult, stats: &ScanStats) {
    let summary = result.summary();

    println!("\n{}", "PII Scan Summary".bold());
    println!("- Total lines scanned: {}", summary.total_lines);
    if summary.skipped_lines > 0 {
        println!(
            "- Lines skipped: {}",
            summary.skipped_lines.to_string().yellow()
        );
    }

    for count in &summary.categories {
        let matches = if count.matches > 0 {
            count.matches.to_string().red()
        } else {
            count.matches.to_string().green()
        };
        println!("- {}: {} matches", count.category, matches);
    }

    println!(
        "\nFound {} matches in {} ({:.0} lines/s)",
        summary.total_matches,
        stats.elapsed_display(),
        stats.lines_per_second()
    );
}

fn print_categories(catalog: &Catalog) {
    for category in catalog.categories() {
        let detail = match category.kind() {
            CategoryKind::Structured => catalog
                .patterns()
                .get(category)
                .map(|m| m.pattern().to_string())
                .unwrap_or_default(),
            CategoryKind::Keyword => catalog
                .keywords()
                .get(category)
                .map(|set| {
                    let phrases = set.phrases();
                    let more = if phrases.len() > 3 { ", ..." } else { "" };
                    format!(
                        "{} keywords: {}{}",
                        phrases.len(),
                        phrases.iter().take(3).join(", "),
                        more
                    )
                })
                .unwrap_or_default(),
        };
        let kind = match category.kind() {
            CategoryKind::Structured => "pattern",
            CategoryKind::Keyword => "keyword",
        };
        println!(
            "{:<24} {:<8} {}",
            category.to_string().blue(),
            kind,
            detail
        );
    }
}
