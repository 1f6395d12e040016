use serde::Deserialize;

use crate::entities::decode_html_entities;

pub const DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

const DEFAULT_ERROR_MESSAGE: &str = "stream generation failed";

/// One tagged record carried on a `data:` line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamEvent {
    pub event: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, alias = "conversationId")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StreamEvent {
    /// Text to append for a `message` event: `content`, else `answer`.
    pub fn fragment(&self) -> Option<&str> {
        non_empty(self.content.as_deref()).or_else(|| non_empty(self.answer.as_deref()))
    }

    pub fn error_message(&self) -> String {
        non_empty(self.message.as_deref())
            .or_else(|| non_empty(self.content.as_deref()))
            .unwrap_or(DEFAULT_ERROR_MESSAGE)
            .to_string()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        non_empty(self.conversation_id.as_deref())
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// No `data:` prefix.
    Ignored,
    /// `data:` with an empty payload.
    KeepAlive,
    /// The `[DONE]` sentinel.
    Done,
    /// Payload present but not a valid event record.
    Malformed(String),
    Event(StreamEvent),
}

/// Parse one complete line (without its `\n`).
pub fn parse_line(line: &str) -> LineOutcome {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let Some(payload) = strip_data_prefix(line) else {
        return LineOutcome::Ignored;
    };
    if payload.is_empty() {
        return LineOutcome::KeepAlive;
    }
    if payload == DONE_SENTINEL {
        return LineOutcome::Done;
    }

    let decoded = decode_html_entities(payload);
    match serde_json::from_str::<StreamEvent>(&decoded) {
        Ok(event) => LineOutcome::Event(event),
        Err(err) => LineOutcome::Malformed(err.to_string()),
    }
}

/// Strip one or more `data:` prefixes and surrounding whitespace.
fn strip_data_prefix(line: &str) -> Option<&str> {
    let mut rest = line.strip_prefix(DATA_PREFIX)?;
    loop {
        let trimmed = rest.trim_start();
        match trimmed.strip_prefix(DATA_PREFIX) {
            Some(next) => rest = next,
            None => return Some(trimmed.trim_end()),
        }
    }
}
