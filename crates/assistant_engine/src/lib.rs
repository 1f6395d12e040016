//! Assistant engine: streamed response decoding and turn execution.
mod decode;
mod decoder;
mod engine;
mod entities;
mod line;
mod message;
mod requests;
mod stream;
mod summary;
mod types;

pub use decode::Utf8StreamDecoder;
pub use decoder::{DecoderState, FramingMode, StreamDecoder, StreamError};
pub use engine::EngineHandle;
pub use entities::decode_html_entities;
pub use line::{parse_line, LineOutcome, StreamEvent, DATA_PREFIX, DONE_SENTINEL};
pub use message::AssembledMessage;
pub use requests::TurnRequest;
pub use stream::{ChannelUpdateSink, ReqwestStreamer, StreamSettings, Streamer, UpdateSink};
pub use summary::{parse_medical_summary, MedicalSummary, NO_RECORD};
pub use types::{EngineEvent, FailureKind, MessageUpdate, StreamFailure, TurnId, TurnOutcome};
