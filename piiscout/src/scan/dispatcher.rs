use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use super::chunk::{Chunk, ScanChunk};
use crate::errors::{Result, ScanError};
use crate::input::InputLine;
use crate::results::PartialResult;

/// Splits `lines` into consecutive chunks of at most `chunk_size` lines
pub fn partition(lines: &[InputLine], chunk_size: NonZeroUsize) -> Vec<Chunk<'_>> {
    lines
        .chunks(chunk_size.get())
        .enumerate()
        .map(|(index, lines)| Chunk::new(index, lines))
        .collect()
}

/// Line numbers must be positive and strictly increasing
pub fn validate_line_numbers(lines: &[InputLine]) -> Result<()> {
    let mut previous = 0;
    for line in lines {
        if line.number <= previous {
            return Err(ScanError::InvalidLineNumber {
                previous,
                found: line.number,
            });
        }
        previous = line.number;
    }
    Ok(())
}

/// Runs a chunk scanner over a partitioned input on a bounded pool
#[derive(Debug)]
pub struct Dispatcher {
    chunk_size: NonZeroUsize,
    pool: ThreadPool,
}

impl Dispatcher {
    pub fn new(chunk_size: NonZeroUsize, workers: NonZeroUsize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|idx| format!("piiscout-worker-{}", idx))
            .build()?;
        Ok(Self { chunk_size, pool })
    }

    pub fn chunk_size(&self) -> NonZeroUsize {
        self.chunk_size
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Scans every chunk and returns the partial results in chunk order.
    ///
    /// The first failing chunk aborts the scan: chunks not yet started are
    /// not scheduled and no partial output is returned.
    pub fn dispatch<S: ScanChunk>(&self, scanner: &S, lines: &[InputLine]) -> Result<Vec<PartialResult>> {
        validate_line_numbers(lines)?;
        let chunks = partition(lines, self.chunk_size);
        debug!(
            "Dispatching {} chunks of up to {} lines to {} workers",
            chunks.len(),
            self.chunk_size,
            self.worker_count()
        );

        let partials = self.pool.install(|| {
            chunks
                .par_iter()
                .map(|chunk| run_chunk(scanner, *chunk))
                .collect::<Result<Vec<_>>>()
        })?;

        debug!("All {} chunks completed", partials.len());
        Ok(partials)
    }
}

fn run_chunk<S: ScanChunk>(scanner: &S, chunk: Chunk<'_>) -> Result<PartialResult> {
    let first_line = chunk.first_line();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| scanner.scan_chunk(chunk)))
        .unwrap_or_else(|payload| {
            Err(ScanError::matcher_fault(
                chunk.index,
                first_line,
                panic_message(payload.as_ref()),
            ))
        });

    outcome.map_err(|e| {
        warn!("Chunk {} failed: {}", chunk.index, e);
        ScanError::worker_failure(chunk.index, first_line, e)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
