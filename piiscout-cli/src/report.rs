use anyhow::{Context, Result};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use piiscout::{Category, MatchRecord, ScanResult};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::debug;

/// On-disk format of the per-category reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// `Line N: before[[match]]after`, one record per line
    Text,
    /// Pretty-printed JSON document per batch
    Json,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

/// Records of one category that go into one report file
#[derive(Debug)]
pub struct ReportBatch<'a> {
    pub category: Category,
    /// 1-based batch number within the category
    pub number: usize,
    pub records: &'a [MatchRecord],
}

/// Writes scan results as batched report files under
/// `<output_dir>/<Category>/<Category>_<n>.<ext>`
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    format: ReportFormat,
    batch_size: NonZeroUsize,
    show_progress: bool,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, format: ReportFormat, batch_size: NonZeroUsize) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            batch_size,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Splits every non-empty category into batches, in catalog order
    pub fn batches<'a>(&self, result: &'a ScanResult) -> Vec<ReportBatch<'a>> {
        let size = self.batch_size.get();
        result
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .flat_map(|(category, records)| {
                records
                    .chunks(size)
                    .enumerate()
                    .map(move |(i, records)| ReportBatch {
                        category,
                        number: i + 1,
                        records,
                    })
            })
            .collect()
    }

    pub fn batch_path(&self, category: Category, number: usize) -> PathBuf {
        self.output_dir.join(category.as_str()).join(format!(
            "{}_{}.{}",
            category,
            number,
            self.format.extension()
        ))
    }

    /// Writes every batch in parallel and returns the created files
    pub fn write(&self, result: &ScanResult) -> Result<Vec<PathBuf>> {
        let batches = self.batches(result);

        for category in batches.iter().map(|b| b.category).dedup() {
            let dir = self.output_dir.join(category.as_str());
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
        }

        let progress = if self.show_progress {
            ProgressBar::new(batches.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} reports")?
                .progress_chars("=>-"),
        );

        let paths = batches
            .par_iter()
            .map(|batch| -> Result<PathBuf> {
                let path = self.write_batch(batch)?;
                progress.inc(1);
                Ok(path)
            })
            .collect::<Result<Vec<_>>>()?;

        progress.finish_and_clear();
        debug!(
            "Wrote {} report files to {}",
            paths.len(),
            self.output_dir.display()
        );
        Ok(paths)
    }

    fn write_batch(&self, batch: &ReportBatch<'_>) -> Result<PathBuf> {
        let path = self.batch_path(batch.category, batch.number);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        let mut out = BufWriter::new(file);

        match self.format {
            ReportFormat::Text => {
                for record in batch.records {
                    writeln!(out, "{}", render_text(record))?;
                }
            }
            ReportFormat::Json => {
                let document = serde_json::json!({
                    "category": batch.category,
                    "batch": batch.number,
                    "records": batch.records,
                });
                serde_json::to_writer_pretty(&mut out, &document)?;
                writeln!(out)?;
            }
        }

        out.flush()
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(path)
    }
}

/// Renders a record as `Line N: before[[match]]after`
pub fn render_text(record: &MatchRecord) -> String {
    let h = record.highlight();
    if h.matched.is_empty() {
        return format!("Line {}: {}", record.line_number, h.before);
    }
    format!(
        "Line {}: {}[[{}]]{}",
        record.line_number, h.before, h.matched, h.after
    )
}
