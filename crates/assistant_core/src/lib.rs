//! Assistant core: pure per-turn conversation state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{Conversation, Turn, TurnId, TurnKind, TurnStatus};
pub use update::update;
pub use view_model::{ConversationView, TurnRowView};
