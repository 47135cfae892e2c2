//! One request/response turn against the backend.
//!
//! A turn sends the user message, consumes the event stream, and updates the
//! conversation log through a [`MessageAssembler`]. Progress is reported over
//! an unbounded channel so the caller can render incrementally while the
//! turn runs.

use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::chat::assembly::{Applied, MessageAssembler};
use crate::chat::log::ConversationLog;
use crate::client::{ChatClient, SseEventStream};
use crate::models::ChatRequest;
use crate::sse::{Source, SseEvent};

/// Where a turn is in its lifecycle. There are no retries; a failed turn
/// ends in `Failed` and the user must resend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    NotStarted,
    /// Request sent, response not yet streaming
    Requesting,
    /// Response body is being consumed
    Streaming,
    /// Terminal: request or stream read failed
    Failed,
    /// Terminal: reply fully assembled
    Done,
}

/// Incremental progress reported while a turn runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnUpdate {
    /// A token arrived; `text` is the full reply so far
    Token { delta: String, text: String },
    /// Citations attached to the reply
    Sources { sources: Vec<Source> },
    /// The turn failed; `message` was also pushed to the log
    Failed { message: String },
    /// The reply is complete
    Completed,
}

/// Run one chat turn end to end.
///
/// On failure the user-facing message is pushed to the log as an error entry
/// and the placeholder (if still pending) is removed. Returns the terminal
/// phase.
pub async fn run_turn(
    client: &ChatClient,
    request: &ChatRequest,
    log: &mut ConversationLog,
    updates: &mpsc::UnboundedSender<TurnUpdate>,
) -> TurnPhase {
    tracing::debug!(thread_id = %request.thread_id, "turn phase: {:?}", TurnPhase::Requesting);

    let mut assembler = MessageAssembler::new();
    assembler.begin(log);

    let events = match client.stream(request).await {
        Ok(events) => events,
        Err(error) => {
            tracing::error!(%error, "chat request failed");
            assembler.finish(log);
            return fail(log, updates, error.user_message());
        }
    };

    tracing::debug!("turn phase: {:?}", TurnPhase::Streaming);
    consume_events(events, &mut assembler, log, updates).await
}

/// Drain the event stream into the assembler, reporting progress.
pub(crate) async fn consume_events(
    mut events: SseEventStream,
    assembler: &mut MessageAssembler,
    log: &mut ConversationLog,
    updates: &mpsc::UnboundedSender<TurnUpdate>,
) -> TurnPhase {
    while let Some(item) = events.next().await {
        match item {
            Ok(event) => match assembler.apply(&event, log) {
                Applied::Appended { delta } => {
                    let _ = updates.send(TurnUpdate::Token {
                        delta,
                        text: assembler.text().to_string(),
                    });
                }
                Applied::SourcesAttached => {
                    if let SseEvent::Sources { sources } = &event {
                        let _ = updates.send(TurnUpdate::Sources {
                            sources: sources.clone(),
                        });
                    }
                }
                Applied::Finished | Applied::PlaceholderDiscarded => {
                    let _ = updates.send(TurnUpdate::Completed);
                    return TurnPhase::Done;
                }
                Applied::None => {}
            },
            Err(error) => {
                tracing::error!(%error, "stream read failed");
                assembler.finish(log);
                return fail(log, updates, error.user_message());
            }
        }
    }

    // Source exhausted without the end marker. Keep whatever was assembled.
    assembler.finish(log);
    let _ = updates.send(TurnUpdate::Completed);
    TurnPhase::Done
}

fn fail(
    log: &mut ConversationLog,
    updates: &mpsc::UnboundedSender<TurnUpdate>,
    message: String,
) -> TurnPhase {
    log.push_error(message.clone());
    let _ = updates.send(TurnUpdate::Failed { message });
    TurnPhase::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::log::Role;
    use crate::error::ClientError;
    use futures_util::stream;

    fn event_source(items: Vec<Result<SseEvent, ClientError>>) -> SseEventStream {
        Box::pin(stream::iter(items))
    }

    fn token(text: &str) -> Result<SseEvent, ClientError> {
        Ok(SseEvent::Token {
            text: text.to_string(),
        })
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TurnUpdate>) -> Vec<TurnUpdate> {
        let mut out = Vec::new();
        while let Ok(update) = rx.try_recv() {
            out.push(update);
        }
        out
    }

    #[tokio::test]
    async fn test_full_turn_assembles_reply() {
        let mut log = ConversationLog::new();
        let mut assembler = MessageAssembler::new();
        let id = assembler.begin(&mut log);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let events = event_source(vec![
            token("Hola"),
            token(" mundo"),
            Ok(SseEvent::Sources {
                sources: vec![Source {
                    url: "http://a".to_string(),
                    title: None,
                }],
            }),
            Ok(SseEvent::Done),
        ]);

        let phase = consume_events(events, &mut assembler, &mut log, &tx).await;

        assert_eq!(phase, TurnPhase::Done);
        let entry = log.entry(id).unwrap();
        assert_eq!(entry.text, "Hola mundo");
        assert_eq!(entry.sources.as_ref().unwrap().len(), 1);

        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 4);
        assert_eq!(
            updates[0],
            TurnUpdate::Token {
                delta: "Hola".to_string(),
                text: "Hola".to_string(),
            }
        );
        assert_eq!(updates[3], TurnUpdate::Completed);
    }

    #[tokio::test]
    async fn test_empty_stream_discards_placeholder() {
        let mut log = ConversationLog::new();
        let mut assembler = MessageAssembler::new();
        let id = assembler.begin(&mut log);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let phase = consume_events(event_source(vec![]), &mut assembler, &mut log, &tx).await;

        assert_eq!(phase, TurnPhase::Done);
        assert!(log.entry(id).is_none());
        assert_eq!(drain(&mut rx), vec![TurnUpdate::Completed]);
    }

    #[tokio::test]
    async fn test_stream_error_pushes_error_entry() {
        let mut log = ConversationLog::new();
        let mut assembler = MessageAssembler::new();
        let id = assembler.begin(&mut log);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let events = event_source(vec![
            token("part"),
            Err(ClientError::RequestFailed {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);

        let phase = consume_events(events, &mut assembler, &mut log, &tx).await;

        assert_eq!(phase, TurnPhase::Failed);
        // Partial text survives, followed by a visible error entry.
        assert_eq!(log.entry(id).unwrap().text, "part");
        let last = log.entries().last().unwrap();
        assert_eq!(last.role, Role::Error);

        let updates = drain(&mut rx);
        assert!(matches!(updates.last(), Some(TurnUpdate::Failed { .. })));
    }

    #[tokio::test]
    async fn test_events_after_done_are_not_dispatched() {
        let mut log = ConversationLog::new();
        let mut assembler = MessageAssembler::new();
        let id = assembler.begin(&mut log);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let events = event_source(vec![token("a"), Ok(SseEvent::Done), token("late")]);
        let phase = consume_events(events, &mut assembler, &mut log, &tx).await;

        assert_eq!(phase, TurnPhase::Done);
        assert_eq!(log.entry(id).unwrap().text, "a");

        let updates = drain(&mut rx);
        assert_eq!(updates.last(), Some(&TurnUpdate::Completed));
        assert_eq!(updates.len(), 2);
    }

    #[tokio::test]
    async fn test_request_failure_leaves_no_placeholder() {
        let mut log = ConversationLog::new();
        let client = ChatClient::with_base_url("http://127.0.0.1:1");
        let request = ChatRequest::new("hola", "thread-1");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let phase = run_turn(&client, &request, &mut log, &tx).await;

        assert_eq!(phase, TurnPhase::Failed);
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].role, Role::Error);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [TurnUpdate::Failed { .. }]
        ));
    }
}
