use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio_util::sync::CancellationToken;

use assistant_logging::{assistant_debug, assistant_info};

use crate::decoder::{StreamDecoder, StreamError};
use crate::message::AssembledMessage;
use crate::requests::TurnRequest;
use crate::{EngineEvent, FailureKind, MessageUpdate, StreamFailure, TurnId, TurnOutcome};

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Limit on waiting for the response head. The body is not covered.
    pub request_timeout: Duration,
    /// Longest silent gap allowed between body chunks.
    pub read_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            read_timeout: Duration::from_secs(60),
            max_bytes: 8 * 1024 * 1024,
        }
    }
}

pub trait UpdateSink: Send + Sync {
    /// Returns `false` once nobody is listening any more.
    fn emit(&self, event: EngineEvent) -> bool;
}

pub struct ChannelUpdateSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelUpdateSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl UpdateSink for ChannelUpdateSink {
    fn emit(&self, event: EngineEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

#[async_trait::async_trait]
pub trait Streamer: Send + Sync {
    /// Run one turn to completion, emitting each decoded update to `sink` in
    /// arrival order. No retries are attempted.
    async fn stream_turn(
        &self,
        turn_id: TurnId,
        request: &TurnRequest,
        sink: &dyn UpdateSink,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, StreamFailure>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStreamer {
    settings: StreamSettings,
}

impl ReqwestStreamer {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, StreamFailure> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .read_timeout(self.settings.read_timeout)
            .build()
            .map_err(|err| StreamFailure::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Streamer for ReqwestStreamer {
    async fn stream_turn(
        &self,
        turn_id: TurnId,
        request: &TurnRequest,
        sink: &dyn UpdateSink,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, StreamFailure> {
        let url = request
            .url(&self.settings.base_url)
            .map_err(|err| StreamFailure::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;
        assistant_info!("Turn {turn_id}: POST {url}");

        let send = client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled()),
            response = tokio::time::timeout(self.settings.request_timeout, send) => match response {
                Ok(response) => response.map_err(map_reqwest_error)?,
                Err(_) => {
                    return Err(StreamFailure::new(
                        FailureKind::Timeout,
                        format!("no response within {:?}", self.settings.request_timeout),
                    ));
                }
            },
        };

        let status = response.status();
        if !status.is_success() {
            return Err(StreamFailure::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let mut decoder = StreamDecoder::new();
        let mut message = AssembledMessage::new();
        let mut updates = Vec::new();
        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(cancelled().with_partial(message.content()));
                }
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk =
                chunk.map_err(|err| map_reqwest_error(err).with_partial(message.content()))?;

            received += chunk.len() as u64;
            if received > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, received)
                    .with_partial(message.content()));
            }

            let fed = decoder.feed_into(&chunk, &mut updates);
            if !forward(turn_id, &mut updates, &mut message, sink) {
                return Err(receiver_gone(turn_id).with_partial(message.content()));
            }
            if let Err(StreamError::Server { message: server_message }) = fed {
                return Err(StreamFailure::new(FailureKind::Server, server_message)
                    .with_partial(message.content()));
            }
            if decoder.is_finished() {
                break;
            }
        }
        updates.extend(decoder.finish());
        if !forward(turn_id, &mut updates, &mut message, sink) {
            return Err(receiver_gone(turn_id).with_partial(message.content()));
        }

        assistant_debug!(
            "Turn {turn_id}: received {received} bytes, {} chars assembled",
            message.content().chars().count()
        );
        Ok(message.into_outcome())
    }
}

/// Apply and emit pending updates in order. Stops at the first undelivered one.
fn forward(
    turn_id: TurnId,
    updates: &mut Vec<MessageUpdate>,
    message: &mut AssembledMessage,
    sink: &dyn UpdateSink,
) -> bool {
    for update in updates.drain(..) {
        message.apply(&update);
        if !sink.emit(EngineEvent::Update { turn_id, update }) {
            return false;
        }
    }
    true
}

fn receiver_gone(turn_id: TurnId) -> StreamFailure {
    assistant_debug!("Turn {turn_id}: update receiver dropped; abandoning stream");
    StreamFailure::new(FailureKind::Cancelled, "update receiver closed")
}

fn cancelled() -> StreamFailure {
    StreamFailure::new(FailureKind::Cancelled, "turn cancelled")
}

fn too_large(max_bytes: u64, actual: u64) -> StreamFailure {
    StreamFailure::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> StreamFailure {
    if err.is_timeout() {
        return StreamFailure::new(FailureKind::Timeout, err.to_string());
    }
    StreamFailure::new(FailureKind::Network, err.to_string())
}
