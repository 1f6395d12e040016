use std::fmt;

pub type TurnId = u64;

/// What one decoded piece of the response means for the displayed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageUpdate {
    /// Append a fragment to the message.
    Append(String),
    /// Replace the whole message (plain-text fallback, or withdrawal of it).
    Replace(String),
    /// First conversation id announced by the server for this stream.
    ConversationId(String),
    /// The server declared the stream complete.
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Update {
        turn_id: TurnId,
        update: MessageUpdate,
    },
    TurnCompleted {
        turn_id: TurnId,
        result: Result<TurnOutcome, StreamFailure>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnOutcome {
    pub content: String,
    pub conversation_id: Option<String>,
    /// True when the server sent an explicit completion marker.
    pub completed: bool,
}

/// Terminal failure of a turn. `partial_content` is whatever had been
/// assembled before the failure and is never rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StreamFailure {
    pub kind: FailureKind,
    pub message: String,
    pub partial_content: String,
}

impl StreamFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            partial_content: String::new(),
        }
    }

    pub(crate) fn with_partial(mut self, content: &str) -> Self {
        self.partial_content = content.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Server,
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Server => write!(f, "server error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
