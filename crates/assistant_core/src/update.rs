use crate::{Conversation, Effect, Msg, TurnKind, TurnStatus};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: Conversation, msg: Msg) -> (Conversation, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::PromptSubmitted => {
            let prompt = state.input().trim().to_string();
            // One turn at a time; the input is kept so it can be resent.
            if prompt.is_empty() || state.is_streaming() {
                return (state, Vec::new());
            }
            let turn_id = state.start_turn(TurnKind::Chat, prompt.clone());
            vec![Effect::StartChat {
                turn_id,
                prompt,
                user_id: state.user_id().to_string(),
                conversation_id: state.conversation_id().map(ToOwned::to_owned),
            }]
        }
        Msg::SummaryRequested {
            visit_id,
            doctor_id,
            patient_id,
        } => {
            if visit_id.trim().is_empty() || state.is_streaming() {
                return (state, Vec::new());
            }
            let prompt = format!("summary for visit {visit_id}");
            let turn_id = state.start_turn(TurnKind::Summary, prompt);
            vec![Effect::StartSummary {
                turn_id,
                visit_id,
                doctor_id,
                patient_id,
            }]
        }
        Msg::CancelClicked => match state.active_turn() {
            Some(turn) => vec![Effect::CancelTurn {
                turn_id: turn.turn_id,
            }],
            None => Vec::new(),
        },
        Msg::FragmentAppended { turn_id, text } => {
            if let Some(turn) = state.streaming_turn_mut(turn_id) {
                turn.content.push_str(&text);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::MessageReplaced { turn_id, text } => {
            if let Some(turn) = state.streaming_turn_mut(turn_id) {
                turn.content = text;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ConversationIdAssigned {
            turn_id,
            conversation_id,
        } => {
            if state.streaming_turn_mut(turn_id).is_some() {
                state.assign_conversation_id(conversation_id);
            }
            Vec::new()
        }
        Msg::TurnCompleted { turn_id } => {
            if let Some(turn) = state.streaming_turn_mut(turn_id) {
                turn.status = TurnStatus::Completed;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TurnFailed { turn_id, message } => {
            if let Some(turn) = state.streaming_turn_mut(turn_id) {
                turn.status = TurnStatus::Failed { message };
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
