pub mod catalog;
pub mod config;
pub mod errors;
pub mod input;
pub mod metrics;
pub mod results;
pub mod scan;

pub use catalog::{Catalog, Category, CategoryKind};
pub use config::{CliOverrides, MalformedLinePolicy, ScanConfig};
pub use errors::{Result, ScanError};
pub use input::{number_lines, read_file, DecodedInput, InputLine};
pub use metrics::{ScanMetrics, ScanStats};
pub use results::{MatchRecord, ScanResult, ScanSummary, Span};
pub use scan::{scan, Scanner};
