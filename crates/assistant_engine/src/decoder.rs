//! Incremental decoder for streamed assistant responses.
//!
//! The body is either SSE-style `data: {...}` lines or raw plain text. Until a
//! line starting with `data:` has been seen, the decoder assumes plain text and
//! re-emits the whole accumulated body on every read. Once framing is detected
//! it switches to line mode for the rest of the stream.

use assistant_logging::{assistant_debug, assistant_warn};

use crate::decode::Utf8StreamDecoder;
use crate::line::{parse_line, LineOutcome, StreamEvent, DATA_PREFIX};
use crate::MessageUpdate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The server sent an `error` event.
    #[error("server reported an error: {message}")]
    Server { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Streaming,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    /// No `data:` line seen yet; the body is shown as plain text.
    PlainTextFallback,
    Sse,
}

pub struct StreamDecoder {
    utf8: Utf8StreamDecoder,
    state: DecoderState,
    mode: FramingMode,
    /// Whole body while in plain-text mode, pending partial line in SSE mode.
    buffer: String,
    /// Start of the line in `buffer` not yet checked for framing.
    scan_from: usize,
    plain_text_emitted: bool,
    conversation_id_seen: bool,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            utf8: Utf8StreamDecoder::new(),
            state: DecoderState::Streaming,
            mode: FramingMode::PlainTextFallback,
            buffer: String::new(),
            scan_from: 0,
            plain_text_emitted: false,
            conversation_id_seen: false,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.state == DecoderState::Finished
    }

    /// Feed one chunk and collect the resulting updates.
    ///
    /// On `Err`, updates decoded from the same chunk before the error event are
    /// discarded; use [`StreamDecoder::feed_into`] to keep them.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<MessageUpdate>, StreamError> {
        let mut updates = Vec::new();
        self.feed_into(bytes, &mut updates)?;
        Ok(updates)
    }

    /// Feed one chunk, pushing updates onto `out` in arrival order.
    ///
    /// An `error` event finishes the decoder and is returned as `Err`; updates
    /// that preceded it stay in `out`. After the decoder has finished, input is
    /// ignored.
    pub fn feed_into(
        &mut self,
        bytes: &[u8],
        out: &mut Vec<MessageUpdate>,
    ) -> Result<(), StreamError> {
        if self.is_finished() {
            return Ok(());
        }

        let text = self.utf8.decode(bytes);
        if text.is_empty() {
            return Ok(());
        }
        self.buffer.push_str(&text);

        match self.mode {
            FramingMode::Sse => self.drain_lines(out),
            FramingMode::PlainTextFallback => {
                if self.detect_framing() {
                    assistant_debug!("Detected data: framing; switching to line mode");
                    self.mode = FramingMode::Sse;
                    if self.plain_text_emitted {
                        out.push(MessageUpdate::Replace(String::new()));
                    }
                    self.drain_lines(out)
                } else {
                    self.plain_text_emitted = true;
                    out.push(MessageUpdate::Replace(self.buffer.clone()));
                    Ok(())
                }
            }
        }
    }

    /// End of input. Any unterminated trailing line is discarded. In plain-text
    /// mode a truncated trailing character is flushed as U+FFFD and the whole
    /// body is re-emitted.
    pub fn finish(&mut self) -> Vec<MessageUpdate> {
        let mut out = Vec::new();
        let tail = self.utf8.finish();
        if !self.is_finished() {
            match self.mode {
                FramingMode::Sse => {
                    let pending = self.buffer.len() + tail.len();
                    if pending > 0 {
                        assistant_debug!("Discarding {pending} bytes of unterminated stream line");
                    }
                }
                FramingMode::PlainTextFallback if !tail.is_empty() => {
                    self.buffer.push_str(&tail);
                    out.push(MessageUpdate::Replace(self.buffer.clone()));
                }
                FramingMode::PlainTextFallback => {}
            }
        }
        self.buffer.clear();
        self.scan_from = 0;
        self.state = DecoderState::Finished;
        out
    }

    fn detect_framing(&mut self) -> bool {
        loop {
            let line = &self.buffer[self.scan_from..];
            if line.starts_with(DATA_PREFIX) {
                return true;
            }
            match line.find('\n') {
                Some(pos) => self.scan_from += pos + 1,
                None => return false,
            }
        }
    }

    fn drain_lines(&mut self, out: &mut Vec<MessageUpdate>) -> Result<(), StreamError> {
        let buffer = std::mem::take(&mut self.buffer);
        let mut rest = buffer.as_str();
        while let Some(pos) = rest.find('\n') {
            let line = &rest[..pos];
            rest = &rest[pos + 1..];
            self.handle_line(line, out)?;
            if self.is_finished() {
                return Ok(());
            }
        }
        self.buffer = rest.to_string();
        Ok(())
    }

    fn handle_line(&mut self, line: &str, out: &mut Vec<MessageUpdate>) -> Result<(), StreamError> {
        match parse_line(line) {
            LineOutcome::Ignored | LineOutcome::KeepAlive => Ok(()),
            LineOutcome::Done => {
                self.complete(out);
                Ok(())
            }
            LineOutcome::Malformed(reason) => {
                assistant_warn!("Dropping malformed stream line ({reason}): {line}");
                Ok(())
            }
            LineOutcome::Event(event) => self.apply_event(event, out),
        }
    }

    fn apply_event(
        &mut self,
        event: StreamEvent,
        out: &mut Vec<MessageUpdate>,
    ) -> Result<(), StreamError> {
        if let Some(id) = event.conversation_id() {
            if !self.conversation_id_seen {
                self.conversation_id_seen = true;
                out.push(MessageUpdate::ConversationId(id.to_string()));
            }
        }

        match event.event.as_str() {
            "message" => {
                if let Some(fragment) = event.fragment() {
                    out.push(MessageUpdate::Append(fragment.to_string()));
                }
                Ok(())
            }
            "completed" => {
                self.complete(out);
                Ok(())
            }
            "error" => {
                self.state = DecoderState::Finished;
                Err(StreamError::Server {
                    message: event.error_message(),
                })
            }
            other => {
                assistant_debug!("Ignoring stream event {other:?}");
                Ok(())
            }
        }
    }

    fn complete(&mut self, out: &mut Vec<MessageUpdate>) {
        self.state = DecoderState::Finished;
        out.push(MessageUpdate::Completed);
    }
}
