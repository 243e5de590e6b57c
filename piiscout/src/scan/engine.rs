use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::chunk::ChunkScanner;
use super::dispatcher::Dispatcher;
use super::merger::merge;
use crate::catalog::Catalog;
use crate::config::{MalformedLinePolicy, ScanConfig};
use crate::errors::Result;
use crate::input::{self, DecodedInput, InputLine};
use crate::metrics::{ScanMetrics, ScanStats};
use crate::results::ScanResult;

/// Scans numbered lines for PII using a fixed catalog and worker pool
#[derive(Debug)]
pub struct Scanner {
    catalog: Arc<Catalog>,
    dispatcher: Dispatcher,
    malformed_lines: MalformedLinePolicy,
}

impl Scanner {
    /// Compiles the active catalog and starts the worker pool
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let catalog = match &config.categories {
            Some(categories) => Arc::new(Catalog::with_categories(categories)?),
            None => Catalog::shared()?,
        };
        let dispatcher = Dispatcher::new(config.chunk_size, config.thread_count)?;
        debug!(
            "Scanner ready: {} categories, chunk size {}, {} workers",
            catalog.len(),
            config.chunk_size,
            dispatcher.worker_count()
        );
        Ok(Self {
            catalog,
            dispatcher,
            malformed_lines: config.malformed_lines,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Scans already-decoded lines
    pub fn scan(&self, lines: &[InputLine]) -> Result<ScanResult> {
        self.run(lines, lines.len(), &[]).map(|(result, _)| result)
    }

    /// Scans decoded input, carrying over the lines skipped while decoding
    pub fn scan_input(&self, input: &DecodedInput) -> Result<ScanResult> {
        self.scan_with_stats(input).map(|(result, _)| result)
    }

    /// Like [`Scanner::scan_input`], also returning throughput figures
    pub fn scan_with_stats(&self, input: &DecodedInput) -> Result<(ScanResult, ScanStats)> {
        self.run(&input.lines, input.total_lines, &input.skipped)
    }

    /// Reads, decodes and scans a file
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult> {
        let input = input::read_file(path, self.malformed_lines)?;
        self.scan_input(&input)
    }

    fn run(
        &self,
        lines: &[InputLine],
        total_lines: usize,
        skipped: &[usize],
    ) -> Result<(ScanResult, ScanStats)> {
        info!(
            "Starting scan of {} lines across {} categories",
            lines.len(),
            self.catalog.len()
        );

        let metrics = ScanMetrics::new();
        metrics.record_skipped(skipped.len());
        let scanner = ChunkScanner::new(Arc::clone(&self.catalog));

        let partials = self.dispatcher.dispatch(&scanner, lines)?;
        for partial in &partials {
            metrics.record_chunk(partial.lines_scanned, partial.total_matches());
            metrics.record_exclusions(partial.excluded);
        }
        let categories = merge(&self.catalog, partials)?;

        let result = ScanResult {
            categories,
            lines_scanned: total_lines,
            skipped_lines: skipped.to_vec(),
        };

        info!(
            "Scan complete. Found {} matches in {} lines",
            result.total_matches(),
            total_lines
        );
        metrics.log_stats();
        Ok((result, metrics.get_stats()))
    }
}

/// Scans `lines` with a one-off [`Scanner`] built from `config`
pub fn scan(lines: &[InputLine], config: &ScanConfig) -> Result<ScanResult> {
    Scanner::new(config)?.scan(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::errors::ScanError;
    use crate::input::number_lines;
    use std::fs;
    use std::num::NonZeroUsize;
    use tempfile::tempdir;

    fn config(chunk_size: usize, threads: usize) -> ScanConfig {
        ScanConfig {
            chunk_size: NonZeroUsize::new(chunk_size).unwrap(),
            thread_count: NonZeroUsize::new(threads).unwrap(),
            ..ScanConfig::default()
        }
    }

    fn sample_lines() -> Vec<InputLine> {
        let templates = [
            "Contact: john.doe@example.com or 9876543210, IP 192.168.1.5",
            "Please update your home_address to 221B Baker Street",
            "PAN ABCDE1234F, GSTIN 27ABCDE1234F1Z5",
            "nothing to see here",
            "card 4111-1111-1111-1111 exp 12/29 dob: 01/01/1990",
            "server 203.0.113.9 mac 00:1A:2B:3C:4D:5E",
            "policy number POL123 for customer_id 8812",
            "DL MH12 20110012345 voter ABC1234567",
        ];
        number_lines((0..400).map(|i| templates[i % templates.len()]))
    }

    #[test]
    fn test_contact_scenario() {
        let mut lines = number_lines(vec![""; 6]);
        lines.push(InputLine::new(
            7,
            "Contact: john.doe@example.com or 9876543210, IP 192.168.1.5",
        ));

        let result = scan(&lines, &config(1000, 2)).unwrap();
        let email = result.get(Category::Email);
        assert_eq!(email.len(), 1);
        assert_eq!(email[0].line_number, 7);
        assert_eq!(email[0].matched_text, "john.doe@example.com");
        assert_eq!(result.get(Category::Mobile)[0].matched_text, "9876543210");
        assert!(result.get(Category::Ip).is_empty());
        assert_eq!(result.lines_scanned, 7);
    }

    #[test]
    fn test_home_address_scenario() {
        let lines = number_lines(["Please update your home_address to 221B Baker Street"]);
        let result = scan(&lines, &config(10, 1)).unwrap();
        let address = result.get(Category::Address);
        assert_eq!(address.len(), 1);
        assert_eq!(address[0].matched_text, "home_address");
        assert_eq!(address[0].span, None);
    }

    #[test]
    fn test_same_result_for_any_chunk_size_and_worker_count() {
        let lines = sample_lines();
        let reference = scan(&lines, &config(1000, 1)).unwrap();
        assert!(reference.total_matches() > 0);

        for (chunk_size, threads) in [(1, 4), (7, 3), (64, 8), (399, 2), (400, 2), (401, 16)] {
            let result = scan(&lines, &config(chunk_size, threads)).unwrap();
            assert_eq!(result, reference, "chunk_size={chunk_size} threads={threads}");
        }
    }

    #[test]
    fn test_rescan_is_identical() {
        let scanner = Scanner::new(&config(13, 4)).unwrap();
        let lines = sample_lines();
        assert_eq!(scanner.scan(&lines).unwrap(), scanner.scan(&lines).unwrap());
    }

    #[test]
    fn test_records_in_line_order() {
        let result = scan(&sample_lines(), &config(5, 4)).unwrap();
        for (_, records) in result.iter() {
            assert!(records.windows(2).all(|w| w[0].line_number <= w[1].line_number));
        }
    }

    #[test]
    fn test_empty_input() {
        let result = scan(&[], &ScanConfig::default()).unwrap();
        assert_eq!(result.lines_scanned, 0);
        assert!(result.is_empty());
        assert_eq!(result.categories.len(), Category::ALL.len());
    }

    #[test]
    fn test_restricted_categories() {
        let config = ScanConfig {
            categories: Some(vec![Category::Ip, Category::Pan]),
            ..config(10, 2)
        };
        let result = scan(&sample_lines(), &config).unwrap();
        assert_eq!(
            result.categories.keys().copied().collect::<Vec<_>>(),
            vec![Category::Pan, Category::Ip]
        );
        assert!(result.get(Category::Email).is_empty());
        assert!(result
            .get(Category::Ip)
            .iter()
            .all(|r| r.matched_text == "203.0.113.9"));
    }

    #[test]
    fn test_invalid_line_numbers() {
        let lines = vec![InputLine::new(2, "a"), InputLine::new(1, "b")];
        let err = scan(&lines, &config(10, 1)).unwrap_err();
        assert!(matches!(err, ScanError::InvalidLineNumber { .. }));
    }

    #[test]
    fn test_scan_with_stats() {
        let scanner = Scanner::new(&config(100, 2)).unwrap();
        let input = DecodedInput {
            lines: sample_lines(),
            skipped: vec![],
            total_lines: 400,
        };
        let (result, stats) = scanner.scan_with_stats(&input).unwrap();
        assert_eq!(stats.chunks, 4);
        assert_eq!(stats.lines_scanned, 400);
        assert_eq!(stats.matches as usize, result.total_matches());
        // 192.168.1.5 on every contact line
        assert_eq!(stats.excluded, 50);
    }

    #[test]
    fn test_stats_do_not_depend_on_partition() {
        let input = DecodedInput {
            lines: sample_lines(),
            skipped: vec![],
            total_lines: 400,
        };
        let (_, reference) = Scanner::new(&config(400, 1))
            .unwrap()
            .scan_with_stats(&input)
            .unwrap();
        for (chunk_size, threads) in [(1, 8), (7, 3), (64, 4)] {
            let (_, stats) = Scanner::new(&config(chunk_size, threads))
                .unwrap()
                .scan_with_stats(&input)
                .unwrap();
            assert_eq!(stats.lines_scanned, reference.lines_scanned);
            assert_eq!(stats.matches, reference.matches);
            assert_eq!(stats.excluded, reference.excluded);
            assert_eq!(stats.chunks as usize, 400usize.div_ceil(chunk_size));
        }
    }

    #[test]
    fn test_scan_file_skipping_malformed_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.log");
        fs::write(&path, b"PAN ABCDE1234F\n\xff\xfe\nmail a@b.co\n").unwrap();

        let config = ScanConfig {
            malformed_lines: MalformedLinePolicy::Skip,
            ..config(1, 2)
        };
        let result = Scanner::new(&config).unwrap().scan_file(&path).unwrap();
        assert_eq!(result.lines_scanned, 3);
        assert_eq!(result.skipped_lines, vec![2]);
        assert_eq!(result.get(Category::Email)[0].line_number, 3);
    }

    #[test]
    fn test_scan_file_aborts_on_malformed_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.log");
        fs::write(&path, b"ok\n\xff\n").unwrap();

        let err = Scanner::new(&config(1, 1))
            .unwrap()
            .scan_file(&path)
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::MalformedInputLine { line_number: 2, .. }
        ));
    }
}
