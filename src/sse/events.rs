//! SSE event types and definitions
//!
//! Contains the SseEvent enum with the closed set of semantic events a
//! decoded stream frame can classify into.

use serde::Deserialize;

/// A cited source attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Typed events decoded from the chat stream.
///
/// Exactly one event is produced per data frame; the set is closed.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// Incremental piece of the assistant's reply
    Token { text: String },
    /// Citation metadata for the current message
    Sources { sources: Vec<Source> },
    /// Explicit marker that the assistant's turn is complete
    Done,
    /// Data frame whose payload failed to parse as JSON
    Unparseable { raw: String },
    /// Non-empty frame without a data prefix (comments, keep-alives)
    Ignored { raw: String },
}

impl SseEvent {
    /// Returns the event type name as a string for debugging purposes.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            SseEvent::Token { .. } => "token",
            SseEvent::Sources { .. } => "sources",
            SseEvent::Done => "done",
            SseEvent::Unparseable { .. } => "unparseable",
            SseEvent::Ignored { .. } => "ignored",
        }
    }

    /// Whether this event carries content that belongs in the transcript.
    pub fn is_content(&self) -> bool {
        matches!(self, SseEvent::Token { .. } | SseEvent::Sources { .. })
    }
}
