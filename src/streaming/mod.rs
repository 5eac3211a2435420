//! Streaming text utilities
//!
//! Upstream chunks arrive as raw bytes whose boundaries need not line up with
//! UTF-8 character boundaries. The decoder here turns them into text without
//! ever splitting a multi-byte character.

/// Incremental UTF-8 decoder for relayed byte chunks.
///
/// An incomplete multi-byte sequence at the end of a chunk is held back and
/// completed by the next chunk. Invalid sequences are replaced with U+FFFD
/// instead of failing the stream.
///
/// # Example
/// ```
/// use mimo_relay::streaming::Utf8ChunkDecoder;
///
/// let mut decoder = Utf8ChunkDecoder::new();
///
/// // "é" is 0xC3 0xA9, split across two chunks
/// assert_eq!(decoder.decode(b"data: caf\xC3"), "data: caf");
/// assert_eq!(decoder.decode(b"\xA9\n\n"), "é\n\n");
/// assert!(!decoder.has_pending());
/// ```
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    /// Bytes of a character that has not been fully received yet
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Create a new empty decoder
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Feed a chunk and return all text that is complete so far.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(bytes);

        let mut text = String::with_capacity(data.len());
        let mut input = data.as_slice();

        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    text.push_str(valid);
                    input = &[];
                    break;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));

                    match err.error_len() {
                        Some(invalid_len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[invalid_len..];
                        }
                        None => {
                            // truncated sequence, wait for the next chunk
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = input.to_vec();
        text
    }

    /// Flush whatever is still held back at end of stream.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&rest).into_owned()
    }

    /// Check if bytes of an unfinished character are buffered
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
