use crate::{MessageUpdate, TurnOutcome};

/// Fragments of one turn concatenated in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssembledMessage {
    content: String,
    conversation_id: Option<String>,
    completed: bool,
}

impl AssembledMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: &MessageUpdate) {
        match update {
            MessageUpdate::Append(fragment) => self.content.push_str(fragment),
            MessageUpdate::Replace(text) => {
                self.content.clear();
                self.content.push_str(text);
            }
            MessageUpdate::ConversationId(id) => {
                if self.conversation_id.is_none() {
                    self.conversation_id = Some(id.clone());
                }
            }
            MessageUpdate::Completed => self.completed = true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn into_outcome(self) -> TurnOutcome {
        TurnOutcome {
            content: self.content,
            conversation_id: self.conversation_id,
            completed: self.completed,
        }
    }
}
