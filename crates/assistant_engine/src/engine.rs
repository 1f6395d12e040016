use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use assistant_logging::{assistant_error, assistant_info, assistant_warn};

use crate::requests::TurnRequest;
use crate::stream::{ChannelUpdateSink, ReqwestStreamer, StreamSettings, Streamer};
use crate::{EngineEvent, TurnId};

enum EngineCommand {
    Start { turn_id: TurnId, request: TurnRequest },
    Cancel { turn_id: TurnId },
}

type ActiveTurns = Arc<Mutex<HashMap<TurnId, CancellationToken>>>;

/// Runs turns on a background thread with its own tokio runtime.
///
/// Each turn gets its own decoder and cancellation token; nothing is shared
/// between turns.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: StreamSettings) -> Self {
        Self::with_streamer(Arc::new(ReqwestStreamer::new(settings)))
    }

    pub fn with_streamer(streamer: Arc<dyn Streamer>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    assistant_error!("Failed to start engine runtime: {err}");
                    return;
                }
            };
            let active: ActiveTurns = Arc::default();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Start { turn_id, request } => {
                        let token = CancellationToken::new();
                        if let Ok(mut turns) = active.lock() {
                            turns.insert(turn_id, token.clone());
                        }
                        let streamer = streamer.clone();
                        let event_tx = event_tx.clone();
                        let active = active.clone();
                        runtime.spawn(async move {
                            run_turn(streamer.as_ref(), turn_id, request, token, event_tx).await;
                            if let Ok(mut turns) = active.lock() {
                                turns.remove(&turn_id);
                            }
                        });
                    }
                    EngineCommand::Cancel { turn_id } => {
                        let token = active.lock().ok().and_then(|turns| turns.get(&turn_id).cloned());
                        match token {
                            Some(token) => token.cancel(),
                            None => assistant_warn!("Cancel requested for unknown turn {turn_id}"),
                        }
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn start(&self, turn_id: TurnId, request: TurnRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Start { turn_id, request });
    }

    pub fn cancel(&self, turn_id: TurnId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { turn_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn run_turn(
    streamer: &dyn Streamer,
    turn_id: TurnId,
    request: TurnRequest,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelUpdateSink::new(event_tx.clone());
    let result = streamer.stream_turn(turn_id, &request, &sink, cancel).await;
    match &result {
        Ok(outcome) => assistant_info!(
            "Turn {turn_id} finished ({} chars, completed marker: {})",
            outcome.content.chars().count(),
            outcome.completed
        ),
        Err(failure) => assistant_warn!("Turn {turn_id} failed: {failure}"),
    }
    let _ = event_tx.send(EngineEvent::TurnCompleted { turn_id, result });
}
