//! Widget-level session state.

use crate::router::{Tab, View};
use crate::storage::{PersistedState, StateStore};
use supportchat_protocol::ConversationId;
use tracing::debug;

/// The single shared mutable record every component reads and mutates.
///
/// Constructed once at startup from durable storage and passed by reference
/// to every component; there are no ambient globals. Email and active
/// conversation id persist through every mutation.
pub struct SessionContext {
    email: Option<String>,
    active_chat: Option<ConversationId>,
    pub expanded: bool,
    pub typing: bool,
    pub current_view: View,
    pub current_tab: Tab,
    pub input_visible: bool,
    store: Box<dyn StateStore>,
}

impl SessionContext {
    /// Seeds the session from durable storage. The initial view depends on
    /// whether a visitor email is already known.
    pub fn restore(store: Box<dyn StateStore>) -> crate::Result<Self> {
        let persisted = store.load()?;
        let current_view = if persisted.email.is_some() {
            View::Conversations
        } else {
            View::Email
        };
        Ok(Self {
            email: persisted.email,
            active_chat: persisted.chat_id.map(ConversationId),
            expanded: false,
            typing: false,
            current_view,
            current_tab: Tab::Home,
            input_visible: true,
            store,
        })
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn set_email(&mut self, email: String) -> crate::Result<()> {
        self.email = Some(email);
        self.persist()
    }

    pub fn active_chat(&self) -> Option<&ConversationId> {
        self.active_chat.as_ref()
    }

    pub fn set_active_chat(&mut self, chat: Option<ConversationId>) -> crate::Result<()> {
        if self.active_chat == chat {
            return Ok(());
        }
        debug!(chat = chat.as_ref().map(ConversationId::as_str), "active conversation changed");
        self.active_chat = chat;
        self.persist()
    }

    fn persist(&self) -> crate::Result<()> {
        let state = PersistedState {
            email: self.email.clone(),
            chat_id: self.active_chat.as_ref().map(|chat| chat.0.clone()),
        };
        self.store.save(&state)?;
        Ok(())
    }
}
