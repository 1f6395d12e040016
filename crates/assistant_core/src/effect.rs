#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartChat {
        turn_id: crate::TurnId,
        prompt: String,
        user_id: String,
        conversation_id: Option<String>,
    },
    StartSummary {
        turn_id: crate::TurnId,
        visit_id: String,
        doctor_id: String,
        patient_id: String,
    },
    CancelTurn {
        turn_id: crate::TurnId,
    },
}
