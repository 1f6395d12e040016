use std::time::Duration;

use assistant_core::{Effect, Msg};
use assistant_engine::{EngineEvent, EngineHandle, MessageUpdate, StreamSettings, TurnRequest};
use assistant_logging::{assistant_info, assistant_warn};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: StreamSettings) -> Self {
        Self {
            engine: EngineHandle::new(settings),
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartChat {
                    turn_id,
                    prompt,
                    user_id,
                    conversation_id,
                } => {
                    assistant_info!(
                        "StartChat turn_id={} prompt_len={} conversation={:?}",
                        turn_id,
                        prompt.len(),
                        conversation_id
                    );
                    self.engine.start(
                        turn_id,
                        TurnRequest::Chat {
                            user_input: prompt,
                            user_id,
                            conversation_id,
                        },
                    );
                }
                Effect::StartSummary {
                    turn_id,
                    visit_id,
                    doctor_id,
                    patient_id,
                } => {
                    assistant_info!("StartSummary turn_id={} visit={}", turn_id, visit_id);
                    self.engine.start(
                        turn_id,
                        TurnRequest::Summary {
                            visit_id,
                            doctor_id,
                            patient_id,
                        },
                    );
                }
                Effect::CancelTurn { turn_id } => {
                    assistant_info!("CancelTurn turn_id={}", turn_id);
                    self.engine.cancel(turn_id);
                }
            }
        }
    }

    /// Wait up to `wait` for engine output, then drain whatever is queued.
    pub fn poll(&self, wait: Duration) -> Vec<Msg> {
        let mut msgs = Vec::new();
        if let Some(event) = self.engine.recv_timeout(wait) {
            msgs.push(map_event(event));
            while let Some(event) = self.engine.try_recv() {
                msgs.push(map_event(event));
            }
        }
        msgs
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Update { turn_id, update } => match update {
            MessageUpdate::Append(text) => Msg::FragmentAppended { turn_id, text },
            MessageUpdate::Replace(text) => Msg::MessageReplaced { turn_id, text },
            MessageUpdate::ConversationId(conversation_id) => Msg::ConversationIdAssigned {
                turn_id,
                conversation_id,
            },
            MessageUpdate::Completed => Msg::TurnCompleted { turn_id },
        },
        EngineEvent::TurnCompleted { turn_id, result } => match result {
            Ok(_) => Msg::TurnCompleted { turn_id },
            Err(failure) => {
                assistant_warn!("Turn {} failed: {}", turn_id, failure);
                Msg::TurnFailed {
                    turn_id,
                    message: failure.to_string(),
                }
            }
        },
    }
}
