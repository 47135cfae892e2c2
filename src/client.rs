//! Chat backend API client.
//!
//! This module provides the HTTP client for the chat backend, including
//! streaming responses via Server-Sent Events (SSE). The response body is
//! consumed as raw byte chunks and fed through one shared decode pipeline:
//! UTF-8 decoding, frame splitting, and event classification. The same
//! pipeline performs the final flush when the source ends, so a trailing
//! frame without a terminating boundary is still recovered.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;

use crate::config::{Config, DEFAULT_BASE_URL};
use crate::error::ClientError;
use crate::models::{ChatRequest, GoodbyeRequest};
use crate::sse::{decode_frame, FrameSplitter, SseEvent, Utf8Decoder};

/// Stream of decoded events for one assistant turn.
pub type SseEventStream = Pin<Box<dyn Stream<Item = Result<SseEvent, ClientError>> + Send>>;

struct StreamState<S> {
    source: Pin<Box<S>>,
    splitter: FrameSplitter,
    decoder: Utf8Decoder,
    pending: VecDeque<String>,
    ended: bool,
    failed: bool,
}

/// Turn a byte-chunk stream into a stream of decoded events.
///
/// The await on the next chunk is the single suspension point; everything
/// buffered is drained before reading again. A read error is terminal: it is
/// yielded once and the stream ends.
pub(crate) fn event_stream<S>(source: S) -> SseEventStream
where
    S: Stream<Item = Result<Bytes, ClientError>> + Send + 'static,
{
    let state = StreamState {
        source: Box::pin(source),
        splitter: FrameSplitter::new(),
        decoder: Utf8Decoder::new(),
        pending: VecDeque::new(),
        ended: false,
        failed: false,
    };

    let events = stream::unfold(state, |mut state| async move {
        loop {
            // Drain buffered frames first. Whitespace-only frames decode to
            // nothing and are skipped.
            while let Some(frame) = state.pending.pop_front() {
                if let Some(event) = decode_frame(&frame) {
                    tracing::trace!(kind = event.event_type_name(), "decoded stream event");
                    return Some((Ok(event), state));
                }
            }

            if state.ended || state.failed {
                return None;
            }

            match state.source.next().await {
                Some(Ok(chunk)) => {
                    let text = state.decoder.decode(&chunk);
                    state.pending.extend(state.splitter.feed(&text));
                }
                Some(Err(error)) => {
                    state.failed = true;
                    return Some((Err(error), state));
                }
                None => {
                    // End of source: flush the text decoder, then run the
                    // final split pass over whatever remains buffered.
                    state.ended = true;
                    let tail = state.decoder.finish();
                    let mut frames = state.splitter.feed(&tail);
                    frames.extend(state.splitter.finish());
                    state.pending.extend(frames);
                }
            }
        }
    });

    Box::pin(events)
}

/// Client for the chat backend API.
///
/// Provides the streaming chat endpoint plus the small session endpoints
/// (`goodbye`, `health`).
pub struct ChatClient {
    /// Base URL for the backend
    pub base_url: String,
    /// Reusable HTTP client
    client: Client,
}

impl ChatClient {
    /// Create a new ChatClient with the default base URL.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a new ChatClient with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Create a new ChatClient from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_base_url(config.base_url.clone())
    }

    /// Stream one assistant reply from the backend.
    ///
    /// Sends a POST request to `/api/chat` and returns a stream of decoded
    /// events. A non-success status is reported as
    /// [`ClientError::RequestFailed`] before any event is produced.
    pub async fn stream(&self, request: &ChatRequest) -> Result<SseEventStream, ClientError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::RequestFailed { status, message });
        }

        Ok(event_stream(
            response.bytes_stream().map_err(ClientError::Http),
        ))
    }

    /// Notify the backend that the session ended so it can release
    /// per-thread conversation memory.
    pub async fn goodbye(&self, thread_id: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/goodbye", self.base_url);
        let body = GoodbyeRequest {
            thread_id: thread_id.to_string(),
        };

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::RequestFailed { status, message });
        }

        Ok(())
    }

    /// Check if the backend is healthy and reachable.
    pub async fn health_check(&self) -> Result<bool, ClientError> {
        let url = format!("{}/api/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        Ok(response.status().is_success())
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::Source;

    fn chunk_stream(
        chunks: Vec<Result<&'static [u8], ClientError>>,
    ) -> impl Stream<Item = Result<Bytes, ClientError>> {
        stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map(Bytes::from_static))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect_events(
        chunks: Vec<Result<&'static [u8], ClientError>>,
    ) -> Vec<Result<SseEvent, ClientError>> {
        event_stream(chunk_stream(chunks)).collect().await
    }

    #[test]
    fn test_chat_client_new() {
        let client = ChatClient::new();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_chat_client_with_base_url() {
        let client = ChatClient::with_base_url("http://localhost:8080");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_event_stream_simple_turn() {
        let events = collect_events(vec![Ok(
            b"data:{\"token\":\"Hola\"}\n\ndata:{\"token\":\" mundo\"}\n\ndata:{\"event\":\"end\"}\n\n",
        )])
        .await;

        let events: Vec<_> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            events,
            vec![
                SseEvent::Token {
                    text: "Hola".to_string()
                },
                SseEvent::Token {
                    text: " mundo".to_string()
                },
                SseEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_event_stream_frame_split_across_chunks() {
        let events = collect_events(vec![
            Ok(b"data:{\"tok"),
            Ok(b"en\":\"partial\"}"),
            Ok(b"\n"),
            Ok(b"\ndata:{\"event\":\"end\"}\n\n"),
        ])
        .await;

        let events: Vec<_> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            events,
            vec![
                SseEvent::Token {
                    text: "partial".to_string()
                },
                SseEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_event_stream_multibyte_split_across_chunks() {
        // "año" with the "ñ" (0xC3 0xB1) split between chunks.
        let events = collect_events(vec![
            Ok(b"data:{\"token\":\"a\xC3"),
            Ok(b"\xB1o\"}\n\n"),
        ])
        .await;

        let events: Vec<_> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            events,
            vec![SseEvent::Token {
                text: "a\u{00F1}o".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_event_stream_final_frame_without_boundary() {
        let events =
            collect_events(vec![Ok(b"data:{\"token\":\"a\"}\n\ndata:{\"event\":\"end\"}")]).await;

        let events: Vec<_> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            events,
            vec![
                SseEvent::Token {
                    text: "a".to_string()
                },
                SseEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_event_stream_sources_frame() {
        let events = collect_events(vec![Ok(
            b"data:{\"sources_used\":[{\"url\":\"http://x\",\"title\":\"X\"}]}\n\n",
        )])
        .await;

        let events: Vec<_> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            events,
            vec![SseEvent::Sources {
                sources: vec![Source {
                    url: "http://x".to_string(),
                    title: Some("X".to_string()),
                }]
            }]
        );
    }

    #[tokio::test]
    async fn test_event_stream_read_error_is_terminal() {
        let events = collect_events(vec![
            Ok(b"data:{\"token\":\"a\"}\n\n"),
            Err(ClientError::RequestFailed {
                status: 0,
                message: "connection reset".to_string(),
            }),
            Ok(b"data:{\"token\":\"never seen\"}\n\n"),
        ])
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].as_ref().unwrap(),
            &SseEvent::Token {
                text: "a".to_string()
            }
        );
        assert!(events[1].is_err());
    }

    #[tokio::test]
    async fn test_event_stream_whitespace_frames_yield_nothing() {
        let events = collect_events(vec![Ok(b"\n\n  \n\n\ndata:{\"event\":\"end\"}\n\n")]).await;

        let events: Vec<_> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(events, vec![SseEvent::Done]);
    }

    #[tokio::test]
    async fn test_event_stream_comment_and_bad_json() {
        let events = collect_events(vec![Ok(b": keep-alive\n\ndata: not-json\n\n")]).await;

        let events: Vec<_> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            events,
            vec![
                SseEvent::Ignored {
                    raw: ": keep-alive".to_string()
                },
                SseEvent::Unparseable {
                    raw: "not-json".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_event_stream_empty_source() {
        let events = collect_events(vec![]).await;
        assert!(events.is_empty());
    }

    // HTTP-level failures against an unroutable server.
    #[tokio::test]
    async fn test_stream_with_invalid_server() {
        let client = ChatClient::with_base_url("http://127.0.0.1:1");
        let request = ChatRequest::new("hola", "thread-1");
        let result = client.stream(&request).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_goodbye_with_invalid_server() {
        let client = ChatClient::with_base_url("http://127.0.0.1:1");
        let result = client.goodbye("thread-1").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_check_with_invalid_server() {
        let client = ChatClient::with_base_url("http://127.0.0.1:1");
        let result = client.health_check().await;
        assert!(result.is_err());
    }
}
