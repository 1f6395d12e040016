use encoding_rs::{CoderResult, Decoder, UTF_8};

use assistant_logging::assistant_warn;

/// Incremental UTF-8 decoder for a chunked response body.
///
/// Multi-byte sequences split across chunks are held back until the rest of
/// the sequence arrives. Invalid bytes are replaced with U+FFFD. A leading BOM
/// is removed.
pub struct Utf8StreamDecoder {
    decoder: Decoder,
    finished: bool,
    reported_errors: bool,
}

impl Default for Utf8StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            finished: false,
            reported_errors: false,
        }
    }

    /// Decode one chunk, returning every character that is now complete.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.decode_inner(bytes, false)
    }

    /// Flush the decoder. A truncated trailing sequence becomes U+FFFD.
    /// Further calls to `decode` return nothing.
    pub fn finish(&mut self) -> String {
        self.decode_inner(&[], true)
    }

    fn decode_inner(&mut self, bytes: &[u8], last: bool) -> String {
        if self.finished {
            return String::new();
        }

        let mut out = String::new();
        let mut remaining = bytes;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(remaining.len())
                .unwrap_or(remaining.len() + 16);
            out.reserve(needed);
            let (result, read, had_errors) =
                self.decoder.decode_to_string(remaining, &mut out, last);
            if had_errors && !self.reported_errors {
                self.reported_errors = true;
                assistant_warn!("Response body contains invalid UTF-8; replacing bad bytes");
            }
            remaining = &remaining[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }

        if last {
            self.finished = true;
        }
        out
    }
}
