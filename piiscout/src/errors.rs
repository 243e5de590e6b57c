/// Error types for piiscout.
///
/// A PII scan either completes over every input line or fails as a whole; no
/// variant below is recovered from inside the engine. Dropping a private
/// network address through an exclusion predicate is not an error.
///
/// Callers typically match on the variant to decide what to tell the user:
/// ```rust,ignore
/// match scanner.scan(&lines) {
///     Ok(result) => render(result),
///     Err(ScanError::MalformedInputLine { line_number, .. }) => // point at the line,
///     Err(ScanError::WorkerFailure { chunk_index, .. }) => // report the failed chunk,
///     Err(e) => // anything else is fatal too
/// }
/// ```
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::Category;

/// Result type for scan operations
pub type Result<T, E = ScanError> = std::result::Result<T, E>;

/// Errors that can occur while building a catalog or scanning input
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Malformed input at line {line_number}: {source}")]
    MalformedInputLine {
        line_number: usize,
        source: std::str::Utf8Error,
    },
    #[error("Matcher fault in chunk {chunk_index} (starting at line {first_line}): {message}")]
    MatcherFault {
        chunk_index: usize,
        first_line: usize,
        message: String,
    },
    #[error("Worker failed on chunk {chunk_index} (starting at line {first_line}): {source}")]
    WorkerFailure {
        chunk_index: usize,
        first_line: usize,
        source: Box<ScanError>,
    },
    #[error("Category mismatch: {category} is not part of the active catalog")]
    CategoryMismatch { category: Category },
    #[error("Chunk sequence broken: expected chunk {expected}, found {found}")]
    ChunkSequence { expected: usize, found: usize },
    #[error("Invalid line number {found} after line {previous}")]
    InvalidLineNumber { previous: usize, found: usize },
    #[error("Invalid pattern for {category}: {source}")]
    InvalidPattern {
        category: Category,
        source: regex::Error,
    },
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    pub fn malformed_line(line_number: usize, source: std::str::Utf8Error) -> Self {
        Self::MalformedInputLine {
            line_number,
            source,
        }
    }

    pub fn matcher_fault(chunk_index: usize, first_line: usize, message: impl Into<String>) -> Self {
        Self::MatcherFault {
            chunk_index,
            first_line,
            message: message.into(),
        }
    }

    pub fn worker_failure(chunk_index: usize, first_line: usize, source: ScanError) -> Self {
        Self::WorkerFailure {
            chunk_index,
            first_line,
            source: Box::new(source),
        }
    }

    pub fn category_mismatch(category: Category) -> Self {
        Self::CategoryMismatch { category }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// Maps an I/O error on `path` to the most specific variant
    pub(crate) fn from_io(path: &std::path::Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn invalid_utf8() -> std::str::Utf8Error {
        let bytes = [0x66, 0xff, 0x6f];
        std::str::from_utf8(&bytes).unwrap_err()
    }

    #[test]
    fn test_error_creation() {
        let err = ScanError::malformed_line(3, invalid_utf8());
        assert!(matches!(
            err,
            ScanError::MalformedInputLine { line_number: 3, .. }
        ));

        let err = ScanError::matcher_fault(2, 2001, "boom");
        assert!(matches!(err, ScanError::MatcherFault { chunk_index: 2, .. }));

        let err = ScanError::worker_failure(2, 2001, err);
        assert!(matches!(err, ScanError::WorkerFailure { .. }));

        let err = ScanError::category_mismatch(Category::Ip);
        assert!(matches!(err, ScanError::CategoryMismatch { .. }));

        let err = ScanError::config_error("bad chunk size");
        assert!(matches!(err, ScanError::ConfigError(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = ScanError::matcher_fault(1, 1001, "regex exploded");
        assert_eq!(
            err.to_string(),
            "Matcher fault in chunk 1 (starting at line 1001): regex exploded"
        );

        let err = ScanError::worker_failure(1, 1001, err);
        assert_eq!(
            err.to_string(),
            "Worker failed on chunk 1 (starting at line 1001): \
             Matcher fault in chunk 1 (starting at line 1001): regex exploded"
        );

        let err = ScanError::category_mismatch(Category::VoterId);
        assert_eq!(
            err.to_string(),
            "Category mismatch: VoterID is not part of the active catalog"
        );

        let err = ScanError::InvalidLineNumber {
            previous: 4,
            found: 4,
        };
        assert_eq!(err.to_string(), "Invalid line number 4 after line 4");

        let err = ScanError::file_not_found("input.txt");
        assert_eq!(err.to_string(), "File not found: input.txt");
    }

    #[test]
    fn test_io_error_mapping() {
        let path = Path::new("missing.txt");
        let err = ScanError::from_io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::FileNotFound(_)));

        let err = ScanError::from_io(
            path,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, ScanError::PermissionDenied(_)));

        let err = ScanError::from_io(path, std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert!(matches!(err, ScanError::IoError(_)));
    }
}
