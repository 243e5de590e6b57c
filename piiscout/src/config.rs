use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::catalog::Category;

/// Configuration for a scan.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.piiscout.yaml` in the current directory
/// 3. Global `$HOME/.config/piiscout/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Lines per chunk handed to a worker
/// chunk_size: 1000
///
/// # Worker count (default: CPU cores)
/// thread_count: 4
///
/// # What to do with lines that are not valid UTF-8 (abort, skip)
/// malformed_lines: abort
///
/// # Restrict the scan to some categories (default: all)
/// categories: [PAN, Email, Mobile, Address]
///
/// # Where report files are written
/// output_dir: "output"
///
/// # Records per report file
/// report_batch_size: 100
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
///
/// When using the CLI, command-line arguments take precedence over config file
/// values; see [`ScanConfig::merge_with_cli`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum number of lines per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: NonZeroUsize,

    /// Number of worker threads
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Handling of lines that cannot be decoded
    #[serde(default)]
    pub malformed_lines: MalformedLinePolicy,

    /// Active categories; None scans with the whole catalog
    #[serde(default)]
    pub categories: Option<Vec<Category>>,

    /// Directory that receives report files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of records per report file
    #[serde(default = "default_report_batch_size")]
    pub report_batch_size: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How to treat a line that is not valid UTF-8
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedLinePolicy {
    /// Fail the whole scan
    #[default]
    Abort,
    /// Drop the line, record its number and keep going
    Skip,
}

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

fn default_chunk_size() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN)
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_report_batch_size() -> NonZeroUsize {
    NonZeroUsize::new(100).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            thread_count: default_thread_count(),
            malformed_lines: MalformedLinePolicy::default(),
            categories: None,
            output_dir: default_output_dir(),
            report_batch_size: default_report_batch_size(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Default config locations
        let config_files = [
            dirs::config_dir().map(|p| p.join("piiscout/config.yaml")),
            Some(PathBuf::from(".piiscout.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values.
    /// Every value given on the command line wins, even one equal to the default.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(chunk_size) = cli.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(thread_count) = cli.thread_count {
            self.thread_count = thread_count;
        }
        if let Some(malformed_lines) = cli.malformed_lines {
            self.malformed_lines = malformed_lines;
        }
        if let Some(categories) = cli.categories {
            self.categories = Some(categories);
        }
        if let Some(output_dir) = cli.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(report_batch_size) = cli.report_batch_size {
            self.report_batch_size = report_batch_size;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub chunk_size: Option<NonZeroUsize>,
    pub thread_count: Option<NonZeroUsize>,
    pub malformed_lines: Option<MalformedLinePolicy>,
    pub categories: Option<Vec<Category>>,
    pub output_dir: Option<PathBuf>,
    pub report_batch_size: Option<NonZeroUsize>,
    pub log_level: Option<String>,
}
