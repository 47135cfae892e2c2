//! Conversation state and turn handling.

pub mod assembly;
pub mod log;
pub mod turn;

pub use assembly::{Applied, AssemblyState, MessageAssembler};
pub use log::{ConversationLog, Entry, EntryId, Role};
pub use turn::{run_turn, TurnPhase, TurnUpdate};
