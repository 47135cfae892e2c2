//! Frame classification.
//!
//! Each raw frame produced by the splitter either carries a `data:` JSON
//! payload or is protocol noise (comments, keep-alives). Classification
//! yields at most one [`SseEvent`] per frame; a payload is never
//! double-classified.

use serde::Deserialize;

use super::events::{Source, SseEvent};

/// Marker prefixing every data frame.
pub const DATA_PREFIX: &str = "data:";

/// Value of the `event` field that ends the assistant's turn.
pub const END_EVENT: &str = "end";

/// Recognized fields of a data frame payload. Everything else is ignored;
/// payloads are not validated beyond what classification needs.
#[derive(Debug, Default, Deserialize)]
struct FramePayload {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    sources_used: Option<Vec<Source>>,
    #[serde(default)]
    event: Option<String>,
}

/// Decode one raw frame into a semantic event.
///
/// Returns `None` for all-whitespace frames and for data frames with an
/// empty payload - those produce no event at all. Classification priority:
/// non-empty `token`, then `sources_used`, then `event == "end"`, otherwise
/// the payload is recognized but uninteresting.
pub fn decode_frame(frame: &str) -> Option<SseEvent> {
    let trimmed = frame.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(payload) = trimmed.strip_prefix(DATA_PREFIX) else {
        return Some(SseEvent::Ignored {
            raw: trimmed.to_string(),
        });
    };

    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    let parsed: FramePayload = match serde_json::from_str(payload) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::debug!(%error, "frame payload is not valid JSON");
            return Some(SseEvent::Unparseable {
                raw: payload.to_string(),
            });
        }
    };

    if let Some(text) = parsed.token.filter(|t| !t.is_empty()) {
        Some(SseEvent::Token { text })
    } else if let Some(sources) = parsed.sources_used {
        Some(SseEvent::Sources { sources })
    } else if parsed.event.as_deref() == Some(END_EVENT) {
        Some(SseEvent::Done)
    } else {
        Some(SseEvent::Ignored {
            raw: payload.to_string(),
        })
    }
}
