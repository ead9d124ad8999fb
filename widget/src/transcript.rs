//! Ordered message log for the active conversation.

use chrono::{DateTime, Utc};
use supportchat_protocol::events::Sender;
use supportchat_protocol::rest::StoredMessage;
use supportchat_protocol::ChatStatus;

/// One transcript entry. Never mutated after append except for the derived
/// `replied` flag on quick-reply option blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEntry {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub options: Vec<String>,
    pub replied: bool,
    pub file_url: Option<String>,
}

impl MessageEntry {
    pub fn new(sender: Sender, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp,
            options: Vec::new(),
            replied: false,
            file_url: None,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_file(mut self, file_url: Option<String>) -> Self {
        self.file_url = file_url;
        self
    }
}

impl From<StoredMessage> for MessageEntry {
    fn from(stored: StoredMessage) -> Self {
        Self {
            sender: stored.sender,
            text: stored.text,
            timestamp: stored.timestamp.unwrap_or_else(Utc::now),
            options: stored.options,
            replied: false,
            file_url: stored.file_url,
        }
    }
}

/// Ordered message history for the active conversation.
#[derive(Debug)]
pub struct Transcript {
    entries: Vec<MessageEntry>,
    status: ChatStatus,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            status: ChatStatus::Open,
        }
    }

    /// Replaces the log with a freshly fetched history.
    ///
    /// An options block counts as replied when any later message is from the
    /// visitor. One backward pass tracking "visitor seen yet" covers every
    /// block in linear time.
    pub fn load(&mut self, messages: Vec<StoredMessage>, status: ChatStatus) {
        self.entries = messages.into_iter().map(MessageEntry::from).collect();
        self.status = status;
        let mut visitor_seen = false;
        for entry in self.entries.iter_mut().rev() {
            if !entry.options.is_empty() {
                entry.replied = visitor_seen;
            }
            if entry.sender == Sender::Visitor {
                visitor_seen = true;
            }
        }
    }

    pub fn push(&mut self, entry: MessageEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.status = ChatStatus::Open;
    }

    /// Marks every options block as replied. Once the visitor sends
    /// anything, every rendered option button is disabled.
    pub fn mark_options_replied(&mut self) {
        for entry in &mut self.entries {
            if !entry.options.is_empty() {
                entry.replied = true;
            }
        }
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ChatStatus) {
        self.status = status;
    }

    /// Input visibility invariant: false iff the conversation is closed or
    /// the trailing message carries an unresolved options block.
    pub fn input_visible(&self) -> bool {
        if self.status == ChatStatus::Closed {
            return false;
        }
        match self.entries.last() {
            Some(last) => last.options.is_empty() || last.replied,
            None => true,
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
