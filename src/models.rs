//! Request types for the chat backend API.

use serde::Serialize;

/// Body of `POST /api/chat`. The client generates the thread id (a UUID per
/// session) and sends it with every message of the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub thread_id: String,
}

impl ChatRequest {
    /// Create a request for one user message within a thread.
    pub fn new(message: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            thread_id: thread_id.into(),
        }
    }
}

/// Body of `POST /api/goodbye`, letting the backend release per-thread
/// conversation memory when the session ends.
#[derive(Debug, Clone, Serialize)]
pub struct GoodbyeRequest {
    pub thread_id: String,
}
