use std::sync::Arc;
use tracing::trace;

use crate::catalog::Catalog;
use crate::errors::Result;
use crate::input::InputLine;
use crate::results::{MatchRecord, PartialResult};

/// A contiguous run of input lines and its position in the partition
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub index: usize,
    pub lines: &'a [InputLine],
}

impl<'a> Chunk<'a> {
    pub fn new(index: usize, lines: &'a [InputLine]) -> Self {
        Self { index, lines }
    }

    /// Number of the chunk's first line, 0 for an empty chunk
    pub fn first_line(&self) -> usize {
        self.lines.first().map_or(0, |l| l.number)
    }
}

/// Anything the dispatcher can run on a chunk
pub trait ScanChunk: Sync {
    fn scan_chunk(&self, chunk: Chunk<'_>) -> Result<PartialResult>;
}

/// Applies the catalog to every line of a chunk.
///
/// Holds only the read-only catalog; counts travel back on the [`PartialResult`].
#[derive(Debug, Clone)]
pub struct ChunkScanner {
    catalog: Arc<Catalog>,
}

impl ChunkScanner {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Scans a chunk. The output depends only on the chunk and the catalog.
    pub fn scan(&self, chunk: Chunk<'_>) -> PartialResult {
        let mut partial = PartialResult::new(chunk.index, self.catalog.categories());
        for line in chunk.lines {
            self.scan_line(line, &mut partial);
        }
        partial.lines_scanned = chunk.lines.len();
        trace!(
            "Chunk {} (lines {}..={}) produced {} records",
            chunk.index,
            chunk.first_line(),
            chunk.lines.last().map_or(0, |l| l.number),
            partial.total_matches()
        );
        partial
    }

    fn scan_line(&self, line: &InputLine, partial: &mut PartialResult) {
        for matcher in self.catalog.patterns().matchers() {
            let category = matcher.category();
            for (span, text) in matcher.find_iter(&line.text) {
                if matcher.excludes(text) {
                    trace!("Excluded {} '{}' at line {}", category, text, line.number);
                    partial.excluded += 1;
                    continue;
                }
                partial
                    .records
                    .entry(category)
                    .or_default()
                    .push(MatchRecord::structured(line.number, line.text.as_str(), span, text));
            }
        }

        // first keyword in list order wins, one record per line and category
        for set in self.catalog.keywords().sets() {
            if let Some(hit) = set.first_match(&line.text) {
                partial
                    .records
                    .entry(set.category())
                    .or_default()
                    .push(MatchRecord::keyword(line.number, line.text.as_str(), hit.text));
            }
        }
    }
}

impl ScanChunk for ChunkScanner {
    fn scan_chunk(&self, chunk: Chunk<'_>) -> Result<PartialResult> {
        Ok(self.scan(chunk))
    }
}
