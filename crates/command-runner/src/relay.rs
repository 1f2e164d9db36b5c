//! Relaying of child process output to writers and the classifier
//!
//! Each output stream of a child is copied chunk by chunk to its destination
//! writer. When a [`Classifier`] is configured the same bytes are also split
//! into lines and every complete line is classified. The bytes reaching the
//! writer are never altered by the line splitting.

use crate::classifier::Classifier;
use crate::output::SharedWriter;
use futures::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use std::fmt;
use std::io;
use tracing::debug;

/// Longest line, in bytes, that is still matched against error patterns
pub const MAX_CLASSIFIED_LINE_LEN: usize = 16 * 1024;

const CHUNK_SIZE: usize = 8 * 1024;

/// Source of relayed output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Stdout => f.write_str("stdout"),
            LogSource::Stderr => f.write_str("stderr"),
        }
    }
}

/// Splits a byte stream into lines for classification.
///
/// Lines longer than [`MAX_CLASSIFIED_LINE_LEN`] are dropped instead of
/// buffered; scanning resumes with the next line.
#[derive(Debug, Default)]
pub struct LineScanner {
    buf: Vec<u8>,
    overflowed: bool,
}

impl LineScanner {
    /// Create an empty scanner
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of output, calling `on_line` for every line it completes
    pub fn feed(&mut self, chunk: &[u8], mut on_line: impl FnMut(&str)) {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.push(&rest[..pos]);
            self.emit(&mut on_line);
            rest = &rest[pos + 1..];
        }
        self.push(rest);
    }

    /// Flush the final line of a stream that did not end in a newline
    pub fn finish(&mut self, mut on_line: impl FnMut(&str)) {
        if !self.buf.is_empty() || self.overflowed {
            self.emit(&mut on_line);
        }
    }

    fn push(&mut self, segment: &[u8]) {
        if self.overflowed {
            return;
        }
        if self.buf.len() + segment.len() > MAX_CLASSIFIED_LINE_LEN {
            debug!(
                limit = MAX_CLASSIFIED_LINE_LEN,
                "Line exceeds classification limit, skipping it"
            );
            self.overflowed = true;
            self.buf = Vec::new();
            return;
        }
        self.buf.extend_from_slice(segment);
    }

    fn emit(&mut self, on_line: &mut impl FnMut(&str)) {
        if !self.overflowed {
            let line = String::from_utf8_lossy(&self.buf);
            on_line(line.strip_suffix('\r').unwrap_or(&*line));
        }
        self.buf.clear();
        self.overflowed = false;
    }
}

/// Copy `reader` to `writer` until end of stream.
///
/// Every chunk is flushed as soon as it is written so output shows up while
/// the child is still running. With a classifier, complete lines are
/// classified as they arrive.
pub async fn relay<R>(
    mut reader: R,
    writer: &SharedWriter,
    classifier: Option<&Classifier>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut scan = classifier.map(|classifier| (LineScanner::new(), classifier));
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        {
            let mut out = writer.lock().await;
            out.write_all(&chunk[..n]).await?;
            out.flush().await?;
        }

        if let Some((scanner, classifier)) = scan.as_mut() {
            scanner.feed(&chunk[..n], |line| classifier.classify(line));
        }
    }

    if let Some((scanner, classifier)) = scan.as_mut() {
        scanner.finish(|line| classifier.classify(line));
    }
    Ok(())
}
