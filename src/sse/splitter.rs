//! Frame boundary scanning with carried remainder.
//!
//! Frames are separated by runs of two or more line terminators, where a
//! terminator is CRLF, a lone LF, or a lone CR. Mixed runs count as a single
//! boundary. A single terminator never splits a frame, so token text may
//! carry embedded newlines.

use once_cell::sync::Lazy;
use regex::Regex;

/// Candidate boundary: any run of two or more CR/LF bytes. A run must still
/// tokenize to at least two terminators (a lone CRLF is two bytes but one
/// terminator and must not split).
static BOUNDARY_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\r\n]{2,}").expect("boundary pattern is valid")
});

/// Count line terminators in a run of CR/LF bytes, treating CRLF as one.
fn terminator_count(run: &str) -> usize {
    let bytes = run.as_bytes();
    let mut i = 0;
    let mut count = 0;
    while i < bytes.len() {
        if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
            i += 2;
        } else {
            i += 1;
        }
        count += 1;
    }
    count
}

/// Leftmost boundary in `haystack`, as a byte range, or None.
fn next_boundary(haystack: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(m) = BOUNDARY_RUN.find_at(haystack, from) {
        if terminator_count(m.as_str()) >= 2 {
            return Some((m.start(), m.end()));
        }
        // Lone CRLF - part of a frame payload, keep searching after it.
        from = m.end();
    }
    None
}

/// Stateful frame splitter that accumulates decoded text and yields complete
/// frames, retaining any trailing partial frame for the next chunk.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: String,
}

impl FrameSplitter {
    /// Create a new frame splitter with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text and extract every complete frame.
    ///
    /// Text before each boundary is one frame; the unmatched tail stays
    /// buffered so frames split across network reads reassemble correctly.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let mut frames = Vec::new();
        while let Some((start, end)) = next_boundary(&self.buffer) {
            frames.push(self.buffer[..start].to_string());
            self.buffer.drain(..end);
        }
        frames
    }

    /// Final pass at end of source.
    ///
    /// Runs the same boundary scan one last time, then hands back whatever
    /// remains buffered: a trailing frame that never received its boundary
    /// because the source closed is still extracted.
    pub fn finish(&mut self) -> Vec<String> {
        let mut frames = self.feed("");
        let tail = std::mem::take(&mut self.buffer);
        if !tail.is_empty() {
            frames.push(tail);
        }
        frames
    }

    /// Text currently buffered awaiting a boundary.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }
}
