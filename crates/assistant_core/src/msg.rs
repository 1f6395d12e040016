#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the prompt input.
    InputChanged(String),
    /// User submitted the current prompt to the assistant.
    PromptSubmitted,
    /// Doctor asked for a medical summary of a visit.
    SummaryRequested {
        visit_id: String,
        doctor_id: String,
        patient_id: String,
    },
    /// User asked to abandon the streaming turn.
    CancelClicked,
    /// Stream appended a fragment to a turn.
    FragmentAppended { turn_id: crate::TurnId, text: String },
    /// Stream replaced a turn's whole content (plain-text responses).
    MessageReplaced { turn_id: crate::TurnId, text: String },
    /// Server announced the conversation id.
    ConversationIdAssigned {
        turn_id: crate::TurnId,
        conversation_id: String,
    },
    /// Stream for a turn ended normally.
    TurnCompleted { turn_id: crate::TurnId },
    /// Stream for a turn ended with an error.
    TurnFailed {
        turn_id: crate::TurnId,
        message: String,
    },
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
