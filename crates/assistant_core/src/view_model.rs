use crate::{TurnId, TurnKind, TurnStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationView {
    pub conversation_id: Option<String>,
    pub input: String,
    pub is_streaming: bool,
    pub turns: Vec<TurnRowView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRowView {
    pub turn_id: TurnId,
    pub kind: TurnKind,
    pub prompt: String,
    pub content: String,
    pub status: TurnStatus,
}
