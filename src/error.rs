//! Error types for backend communication.
//!
//! A malformed frame payload is deliberately not represented here: it is
//! recovered locally as `SseEvent::Unparseable` and never aborts a stream.
//! The errors below are terminal for the current turn and surfaced to the
//! user as a visible chat entry. Failed turns are not retried; the user
//! must resend.

/// Error type for chat client operations.
#[derive(Debug)]
pub enum ClientError {
    /// HTTP request or stream read failed
    Http(reqwest::Error),
    /// JSON serialization failed
    Json(serde_json::Error),
    /// Server returned a non-success status before streaming began
    RequestFailed { status: u16, message: String },
}

impl ClientError {
    /// User-visible failure text, rendered into the conversation log.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http(e) if e.is_connect() || e.is_timeout() => {
                "Could not reach the server. Please try again later.".to_string()
            }
            ClientError::Http(_) => "Error connecting to the server.".to_string(),
            ClientError::Json(_) => "Failed to encode the request.".to_string(),
            ClientError::RequestFailed { status, .. } => {
                format!("The server rejected the request (status {}).", status)
            }
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Json(e) => write!(f, "JSON error: {}", e),
            ClientError::RequestFailed { status, message } => {
                write!(f, "Request failed ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(e) => Some(e),
            ClientError::Json(e) => Some(e),
            ClientError::RequestFailed { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Json(e)
    }
}
