//! Assembly of one assistant reply from its event stream.
//!
//! The assembler owns the lifecycle of a single assistant entry in the
//! [`ConversationLog`]: a pending placeholder goes up when the turn starts,
//! becomes a real entry on the first content-bearing event, grows
//! append-only as tokens arrive, and is discarded if the stream ends before
//! any content was produced.

use crate::chat::log::{ConversationLog, EntryId};
use crate::sse::SseEvent;

/// Lifecycle of the reply under assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    /// No turn in progress
    Idle,
    /// Placeholder shown, no content yet
    AwaitingFirstEvent,
    /// At least one content event applied
    Streaming,
    /// Terminal; later events are dropped
    Finished,
}

/// What applying one event did to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Text grew by `delta`
    Appended { delta: String },
    /// Citations stored on the reply
    SourcesAttached,
    /// Reply completed normally
    Finished,
    /// Stream ended with no content; the placeholder was removed
    PlaceholderDiscarded,
    /// No visible change
    None,
}

/// Builds one assistant reply out of decoded stream events.
#[derive(Debug)]
pub struct MessageAssembler {
    state: AssemblyState,
    container: Option<EntryId>,
    text: String,
}

impl Default for MessageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageAssembler {
    pub fn new() -> Self {
        Self {
            state: AssemblyState::Idle,
            container: None,
            text: String::new(),
        }
    }

    /// Start a turn: push the loading placeholder and await content.
    pub fn begin(&mut self, log: &mut ConversationLog) -> EntryId {
        let id = log.push_placeholder();
        self.state = AssemblyState::AwaitingFirstEvent;
        self.container = Some(id);
        self.text.clear();
        id
    }

    /// Apply one decoded event to the reply under assembly.
    pub fn apply(&mut self, event: &SseEvent, log: &mut ConversationLog) -> Applied {
        if matches!(self.state, AssemblyState::Idle | AssemblyState::Finished) {
            return Applied::None;
        }

        match event {
            SseEvent::Token { text } => {
                let id = self.ensure_container(log);
                self.text.push_str(text);
                log.set_text(id, &self.text);
                Applied::Appended {
                    delta: text.clone(),
                }
            }
            SseEvent::Sources { sources } => {
                // An empty list carries nothing to show and must not turn the
                // placeholder into an empty visible reply.
                if sources.is_empty() {
                    return Applied::None;
                }
                let id = self.ensure_container(log);
                if log.attach_sources(id, sources.clone()) {
                    Applied::SourcesAttached
                } else {
                    Applied::None
                }
            }
            SseEvent::Done => self.complete(log),
            SseEvent::Unparseable { raw } => {
                tracing::warn!(frame = %raw, "skipping unparseable stream frame");
                Applied::None
            }
            SseEvent::Ignored { raw } => {
                tracing::trace!(frame = %raw, "ignoring stream frame");
                Applied::None
            }
        }
    }

    /// End the turn when the event source is exhausted or fails. Completes
    /// the reply exactly like a `Done` event would, so a stream that drops
    /// without the end marker still leaves the log consistent.
    pub fn finish(&mut self, log: &mut ConversationLog) -> Applied {
        if matches!(self.state, AssemblyState::Idle | AssemblyState::Finished) {
            return Applied::None;
        }
        self.complete(log)
    }

    fn complete(&mut self, log: &mut ConversationLog) -> Applied {
        let awaiting = self.state == AssemblyState::AwaitingFirstEvent;
        self.state = AssemblyState::Finished;

        if awaiting {
            if let Some(id) = self.container {
                log.remove(id);
            }
            self.container = None;
            Applied::PlaceholderDiscarded
        } else {
            Applied::Finished
        }
    }

    /// Materialize the placeholder on the first content-bearing event.
    fn ensure_container(&mut self, log: &mut ConversationLog) -> EntryId {
        let id = match self.container {
            Some(id) => id,
            // Unreachable while begin() precedes apply(); recover anyway.
            None => {
                let id = log.push_placeholder();
                self.container = Some(id);
                id
            }
        };
        if self.state == AssemblyState::AwaitingFirstEvent {
            log.materialize(id);
            self.state = AssemblyState::Streaming;
        }
        id
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn container(&self) -> Option<EntryId> {
        self.container
    }

    /// Full text assembled so far.
    pub fn text(&self) -> &str {
        &self.text
    }
}
