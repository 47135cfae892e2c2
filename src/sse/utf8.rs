//! Streaming bytes-to-text decoding.
//!
//! Network chunks can end mid-way through a multi-byte UTF-8 sequence. The
//! decoder withholds an incomplete trailing sequence until the next chunk
//! completes it, and substitutes U+FFFD for bytes that are invalid outright.

/// Incremental UTF-8 decoder carrying partial sequences across chunks.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a new decoder with no pending bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, prepending bytes withheld from the previous call.
    pub fn decode(&mut self, input: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(input);

        let mut out = String::with_capacity(buf.len());
        let mut rest: &[u8] = &buf;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or(""));
                    match error.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid_len..];
                        }
                        None => {
                            // Incomplete trailing sequence - hold it for the
                            // next chunk.
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush at end of source. An incomplete sequence that never completed
    /// decodes lossily.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}
