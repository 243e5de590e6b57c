use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::config::MalformedLinePolicy;
use crate::errors::{Result, ScanError};

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// A decoded input line and its 1-based position in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLine {
    pub number: usize,
    pub text: String,
}

impl InputLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Numbers already-decoded lines from 1
pub fn number_lines<I, S>(lines: I) -> Vec<InputLine>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| InputLine::new(i + 1, text))
        .collect()
}

/// Lines ready for scanning plus bookkeeping about the ones that were not
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedInput {
    pub lines: Vec<InputLine>,
    /// Numbers of lines dropped under [`MalformedLinePolicy::Skip`]
    pub skipped: Vec<usize>,
    /// Every line seen, skipped ones included
    pub total_lines: usize,
}

struct LineDecoder {
    policy: MalformedLinePolicy,
    decoded: DecodedInput,
}

impl LineDecoder {
    fn new(policy: MalformedLinePolicy) -> Self {
        Self {
            policy,
            decoded: DecodedInput::default(),
        }
    }

    /// Takes one raw line without its `\n`
    fn push(&mut self, raw: &[u8]) -> Result<()> {
        self.decoded.total_lines += 1;
        let number = self.decoded.total_lines;
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

        match std::str::from_utf8(raw) {
            Ok(text) => {
                self.decoded.lines.push(InputLine::new(number, text));
                Ok(())
            }
            Err(e) => match self.policy {
                MalformedLinePolicy::Abort => Err(ScanError::malformed_line(number, e)),
                MalformedLinePolicy::Skip => {
                    warn!("Skipping line {}: invalid UTF-8 ({})", number, e);
                    self.decoded.skipped.push(number);
                    Ok(())
                }
            },
        }
    }

    fn finish(self) -> DecodedInput {
        debug!(
            "Decoded {} lines ({} skipped)",
            self.decoded.total_lines,
            self.decoded.skipped.len()
        );
        self.decoded
    }
}

/// Splits `bytes` on `\n` and decodes every line as UTF-8
pub fn decode_lines(bytes: &[u8], policy: MalformedLinePolicy) -> Result<DecodedInput> {
    let mut decoder = LineDecoder::new(policy);
    if !bytes.is_empty() {
        let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        for raw in body.split(|&b| b == b'\n') {
            decoder.push(raw)?;
        }
    }
    Ok(decoder.finish())
}

/// Reads and decodes every line from `reader`
pub fn read_lines<R: BufRead>(mut reader: R, policy: MalformedLinePolicy) -> Result<DecodedInput> {
    let mut decoder = LineDecoder::new(policy);
    let mut buffer = Vec::with_capacity(256);
    while reader.read_until(b'\n', &mut buffer)? > 0 {
        let raw = buffer.strip_suffix(b"\n").unwrap_or(&buffer);
        decoder.push(raw)?;
        buffer.clear();
    }
    Ok(decoder.finish())
}

/// Reads and decodes a whole file; large files are memory mapped
pub fn read_file(path: &Path, policy: MalformedLinePolicy) -> Result<DecodedInput> {
    trace!("Reading input file: {}", path.display());
    let file = File::open(path).map_err(|e| ScanError::from_io(path, e))?;
    let size = file
        .metadata()
        .map_err(|e| ScanError::from_io(path, e))?
        .len();

    if size >= LARGE_FILE_THRESHOLD {
        debug!("Memory mapping {} ({} bytes)", path.display(), size);
        let mmap = unsafe { Mmap::map(&file) }.map_err(ScanError::IoError)?;
        decode_lines(&mmap, policy)
    } else {
        read_lines(BufReader::with_capacity(BUFFER_CAPACITY, file), policy)
    }
}
