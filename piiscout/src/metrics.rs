use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Tracks throughput of a single scan.
///
/// Workers never touch it: the engine records each chunk's counts once the
/// dispatcher has returned. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    started: Instant,

    // Work metrics
    lines_scanned: Arc<AtomicU64>,
    chunks_completed: Arc<AtomicU64>,

    // Match metrics
    matches_found: Arc<AtomicU64>,
    matches_excluded: Arc<AtomicU64>,

    // Input metrics
    lines_skipped: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance; the clock starts now
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            lines_scanned: Arc::new(AtomicU64::new(0)),
            chunks_completed: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
            matches_excluded: Arc::new(AtomicU64::new(0)),
            lines_skipped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a finished chunk
    pub fn record_chunk(&self, lines: usize, matches: usize) {
        let chunks = self.chunks_completed.fetch_add(1, Ordering::Relaxed) + 1;
        self.lines_scanned.fetch_add(lines as u64, Ordering::Relaxed);
        self.matches_found.fetch_add(matches as u64, Ordering::Relaxed);
        debug!(
            "Chunk done: {} lines, {} matches ({} chunks so far)",
            lines, matches, chunks
        );
    }

    /// Records matches dropped by an exclusion predicate
    pub fn record_exclusions(&self, count: usize) {
        self.matches_excluded.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Records lines dropped before scanning
    pub fn record_skipped(&self, lines: usize) {
        self.lines_skipped.fetch_add(lines as u64, Ordering::Relaxed);
    }

    /// Gets current statistics
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            elapsed: self.started.elapsed(),
            lines_scanned: self.lines_scanned.load(Ordering::Relaxed),
            chunks: self.chunks_completed.load(Ordering::Relaxed),
            matches: self.matches_found.load(Ordering::Relaxed),
            excluded: self.matches_excluded.load(Ordering::Relaxed),
            skipped_lines: self.lines_skipped.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Elapsed: {}\n\
             Lines scanned/skipped: {}/{}\n\
             Chunks: {}\n\
             Matches found/excluded: {}/{}\n\
             Throughput: {:.0} lines/s",
            stats.elapsed_display(),
            stats.lines_scanned,
            stats.skipped_lines,
            stats.chunks,
            stats.matches,
            stats.excluded,
            stats.lines_per_second()
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanStats {
    pub elapsed: Duration,
    pub lines_scanned: u64,
    pub chunks: u64,
    pub matches: u64,
    pub excluded: u64,
    pub skipped_lines: u64,
}

impl ScanStats {
    pub fn lines_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.lines_scanned as f64 / secs
        } else {
            0.0
        }
    }

    /// Elapsed time rounded to milliseconds, e.g. `1s 250ms`
    pub fn elapsed_display(&self) -> String {
        let millis = Duration::from_millis(self.elapsed.as_millis() as u64);
        humantime::format_duration(millis).to_string()
    }
}
