use crate::view_model::{ConversationView, TurnRowView};

pub type TurnId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Chat,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStatus {
    Streaming,
    Completed,
    /// Content received before the failure is kept.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub turn_id: TurnId,
    pub kind: TurnKind,
    pub prompt: String,
    pub content: String,
    pub status: TurnStatus,
}

/// Per-conversation context: conversation id, turns, and the prompt input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    user_id: String,
    conversation_id: Option<String>,
    input: String,
    turns: Vec<Turn>,
    next_turn_id: TurnId,
    dirty: bool,
}

impl Conversation {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn view(&self) -> ConversationView {
        ConversationView {
            conversation_id: self.conversation_id.clone(),
            input: self.input.clone(),
            is_streaming: self.is_streaming(),
            turns: self
                .turns
                .iter()
                .map(|turn| TurnRowView {
                    turn_id: turn.turn_id,
                    kind: turn.kind,
                    prompt: turn.prompt.clone(),
                    content: turn.content.clone(),
                    status: turn.status.clone(),
                })
                .collect(),
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_streaming(&self) -> bool {
        self.active_turn().is_some()
    }

    /// The turn currently receiving a stream, if any.
    pub fn active_turn(&self) -> Option<&Turn> {
        self.turns
            .last()
            .filter(|turn| turn.status == TurnStatus::Streaming)
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn set_input(&mut self, input: String) {
        if self.input != input {
            self.input = input;
            self.dirty = true;
        }
    }

    pub(crate) fn start_turn(&mut self, kind: TurnKind, prompt: String) -> TurnId {
        self.next_turn_id += 1;
        let turn_id = self.next_turn_id;
        self.turns.push(Turn {
            turn_id,
            kind,
            prompt,
            content: String::new(),
            status: TurnStatus::Streaming,
        });
        self.input.clear();
        self.dirty = true;
        turn_id
    }

    /// Mutable access to `turn_id` only while it is the streaming turn.
    pub(crate) fn streaming_turn_mut(&mut self, turn_id: TurnId) -> Option<&mut Turn> {
        self.turns
            .last_mut()
            .filter(|turn| turn.turn_id == turn_id && turn.status == TurnStatus::Streaming)
    }

    pub(crate) fn assign_conversation_id(&mut self, conversation_id: String) {
        if self.conversation_id.is_none() && !conversation_id.is_empty() {
            self.conversation_id = Some(conversation_id);
            self.dirty = true;
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
