//! Conversation log.
//!
//! The log is the ordered record of what the user sees: user messages,
//! assistant replies, and error notices. Entries are addressed by a stable
//! [`EntryId`] handed out at creation, so the streaming code updates its
//! reply in place without searching the log.

use crate::sse::Source;

/// Stable handle to one log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Error,
}

/// One message in the conversation.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: EntryId,
    pub role: Role,
    pub text: String,
    /// Citations attached to an assistant reply, at most once.
    pub sources: Option<Vec<Source>>,
    /// True while the entry is a loading placeholder with no content yet.
    pub pending: bool,
}

/// Ordered conversation history.
#[derive(Debug, Default)]
pub struct ConversationLog {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, role: Role, text: String, pending: bool) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            role,
            text,
            sources: None,
            pending,
        });
        id
    }

    /// Append a user message.
    pub fn push_user(&mut self, text: impl Into<String>) -> EntryId {
        self.push(Role::User, text.into(), false)
    }

    /// Append an error notice.
    pub fn push_error(&mut self, text: impl Into<String>) -> EntryId {
        self.push(Role::Error, text.into(), false)
    }

    /// Append a pending assistant entry shown as a loading indicator until
    /// the first real content arrives.
    pub fn push_placeholder(&mut self) -> EntryId {
        self.push(Role::Assistant, String::new(), true)
    }

    /// Promote a placeholder to a real assistant entry.
    pub fn materialize(&mut self, id: EntryId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.pending = false;
        }
    }

    /// Replace the full text of an entry.
    pub fn set_text(&mut self, id: EntryId, text: &str) {
        if let Some(entry) = self.entry_mut(id) {
            entry.text.clear();
            entry.text.push_str(text);
        }
    }

    /// Attach sources to an entry. A second attempt is a no-op; returns
    /// whether the sources were stored.
    pub fn attach_sources(&mut self, id: EntryId, sources: Vec<Source>) -> bool {
        match self.entry_mut(id) {
            Some(entry) if entry.sources.is_none() => {
                entry.sources = Some(sources);
                true
            }
            _ => false,
        }
    }

    /// Remove an entry, returning whether it existed.
    pub fn remove(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
