/// The scanning pipeline: partition, scan chunks in parallel, merge.
///
/// ```text
/// lines ──partition──▶ chunks ──(rayon pool)──▶ ChunkScanner ──▶ PartialResult[i]
///                                                                    │
///                     ScanResult ◀──────── merge (chunk order) ◀─────┘
/// ```
///
/// # Parallel Processing
///
/// The input is held fully in memory and split into contiguous chunks of at
/// most `chunk_size` lines. Line numbers travel with the lines, so a chunk does
/// not need to know where it sits in the file. Each chunk is scanned on a
/// dedicated Rayon pool:
/// ```rust,ignore
/// let partials: Result<Vec<_>> = pool.install(|| {
///     chunks.par_iter().map(|chunk| run_chunk(scanner, *chunk)).collect()
/// });
/// ```
/// `collect` on an indexed parallel iterator keeps chunk order regardless of
/// which worker finished first, and collecting into a `Result` stops handing
/// out pending chunks as soon as one fails.
///
/// # Shared State
///
/// There is none between workers. The compiled catalog is read-only and each
/// worker builds its own [`PartialResult`](crate::results::PartialResult);
/// results are combined only after every chunk has finished.
pub mod chunk;
pub mod dispatcher;
pub mod engine;
pub mod merger;

pub use chunk::{Chunk, ChunkScanner, ScanChunk};
pub use dispatcher::{partition, validate_line_numbers, Dispatcher};
pub use engine::{scan, Scanner};
pub use merger::merge;
