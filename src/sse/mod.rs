//! SSE-style stream frame parsing.
//!
//! The backend streams its reply as newline-delimited frames carrying JSON
//! payloads. Frames arrive split across arbitrary chunk boundaries and with
//! mixed line-ending conventions, so parsing happens in two stages: the
//! [`FrameSplitter`] reassembles raw frames from buffered text, and
//! [`decode_frame`] classifies each frame into an [`SseEvent`].

mod decoder;
mod events;
mod splitter;
mod utf8;

pub use decoder::decode_frame;
pub use events::{Source, SseEvent};
pub use splitter::FrameSplitter;
pub use utf8::Utf8Decoder;
