//! Realtime channel wrapper: outbound actions and inbound event application.

use crate::effects::{EffectSink, RenderedMessage, UiEffect};
use crate::markdown::MarkdownConverter;
use crate::session::SessionContext;
use crate::transcript::{MessageEntry, Transcript};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use supportchat_protocol::config::WidgetConfig;
use supportchat_protocol::events::{
    ChatUpdate, ClientEvent, ConnectParams, CreateNewChat, JoinChat, OutgoingMessage, Reply,
    Sender, ServerEvent,
};
use supportchat_protocol::rest::CountryInfo;
use supportchat_protocol::{ChatStatus, ConversationId, TenantCode};
use tokio::sync::mpsc;
use tracing::debug;

/// Outbound half of the realtime channel.
pub trait RealtimeChannel: Send + Sync {
    fn emit(&self, event: ClientEvent) -> crate::Result<()>;
}

/// An established realtime connection.
pub struct RealtimeConnection {
    pub channel: Box<dyn RealtimeChannel>,
    pub events: mpsc::UnboundedReceiver<ServerEvent>,
}

/// Transport-supplied connection factory. The connection is opened only once
/// the widget configuration is known, parameterized by tenant code and the
/// current page URL.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> crate::Result<RealtimeConnection>;
}

/// How many recently seen reply identities are kept for de-duplication.
const REPLY_DEDUP_WINDOW: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReplyKey {
    chat: Option<ConversationId>,
    timestamp_ms: i64,
    sender: String,
    text: String,
}

/// Borrowed widget state an inbound event is applied against.
pub struct StreamCx<'a> {
    pub session: &'a mut SessionContext,
    pub transcript: &'a mut Transcript,
    pub effects: &'a EffectSink,
    pub config: &'a WidgetConfig,
    pub markdown: &'a dyn MarkdownConverter,
}

impl StreamCx<'_> {
    pub(crate) fn push_and_render(&mut self, entry: MessageEntry) {
        let rendered = RenderedMessage::new(&entry, self.config, self.markdown);
        self.transcript.push(entry);
        self.effects.emit(UiEffect::RenderMessage(rendered));
    }

    /// Re-derives the input-visibility flag from the transcript and mirrors
    /// it to the shell.
    pub(crate) fn sync_input(&mut self) {
        let visible = self.transcript.input_visible();
        self.session.input_visible = visible;
        self.effects.emit(UiEffect::SetInputVisible(visible));
    }

    fn set_typing(&mut self, typing: bool) {
        if self.session.typing == typing {
            return;
        }
        self.session.typing = typing;
        self.effects.emit(if typing {
            UiEffect::ShowTypingIndicator
        } else {
            UiEffect::HideTypingIndicator
        });
    }
}

/// Wraps the realtime channel: translates inbound events into session and
/// transcript mutations, and outbound user actions into emitted events.
/// Inbound events are applied strictly in delivery order.
pub struct MessageStream {
    channel: Box<dyn RealtimeChannel>,
    tenant: TenantCode,
    page_url: String,
    seen_replies: VecDeque<ReplyKey>,
}

impl MessageStream {
    pub fn new(
        channel: Box<dyn RealtimeChannel>,
        tenant: TenantCode,
        page_url: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            tenant,
            page_url: page_url.into(),
            seen_replies: VecDeque::new(),
        }
    }

    pub fn join_chat(&self, chat: &ConversationId) -> crate::Result<()> {
        self.channel.emit(ClientEvent::JoinChat(JoinChat {
            chat_id: chat.clone(),
        }))
    }

    pub fn create_new_chat(&self, email: &str, country: CountryInfo) -> crate::Result<()> {
        self.channel.emit(ClientEvent::CreateNewChat(CreateNewChat {
            chatbot_code: self.tenant.clone(),
            email: email.to_owned(),
            country,
        }))
    }

    pub fn send_message(
        &self,
        chat: &ConversationId,
        email: &str,
        text: &str,
        file_url: Option<String>,
    ) -> crate::Result<()> {
        self.channel.emit(ClientEvent::Message(OutgoingMessage {
            chatbot_code: self.tenant.clone(),
            chat_id: chat.clone(),
            email: email.to_owned(),
            message: text.to_owned(),
            current_website_url: self.page_url.clone(),
            file_url,
        }))
    }

    /// Applies one inbound event to the widget state.
    pub fn apply(&mut self, event: ServerEvent, cx: &mut StreamCx<'_>) -> crate::Result<()> {
        match event {
            ServerEvent::NewChatData(data) => {
                cx.session.set_active_chat(Some(data.chat.id.clone()))?;
                self.join_chat(&data.chat.id)?;
            }
            ServerEvent::Reply(reply) => self.apply_reply(reply, cx),
            ServerEvent::BotTypingStart => cx.set_typing(true),
            ServerEvent::BotTypingStop => cx.set_typing(false),
            ServerEvent::ChatUpdate(update) => Self::apply_chat_update(update, cx),
        }
        Ok(())
    }

    fn apply_reply(&mut self, reply: Reply, cx: &mut StreamCx<'_>) {
        // The transport delivers at least once. A reply carrying a timestamp
        // has an identity to de-duplicate on; without one there is nothing to
        // compare and the delivery is taken at face value.
        if let Some(timestamp) = reply.timestamp {
            let key = ReplyKey {
                chat: cx.session.active_chat().cloned(),
                timestamp_ms: timestamp.timestamp_millis(),
                sender: reply.sender.to_string(),
                text: reply.text.clone(),
            };
            if self.seen_replies.contains(&key) {
                debug!("dropping duplicate reply delivery");
                return;
            }
            if self.seen_replies.len() == REPLY_DEDUP_WINDOW {
                self.seen_replies.pop_front();
            }
            self.seen_replies.push_back(key);
        }

        cx.set_typing(false);
        let entry = MessageEntry::new(
            reply.sender,
            reply.text,
            reply.timestamp.unwrap_or_else(Utc::now),
        )
        .with_options(reply.options)
        .with_file(reply.file_url);
        cx.push_and_render(entry);
        cx.sync_input();
    }

    fn apply_chat_update(update: ChatUpdate, cx: &mut StreamCx<'_>) {
        if cx.session.active_chat() != Some(&update.chat_id) {
            debug!(chat = %update.chat_id, "ignoring update for inactive conversation");
            return;
        }
        let carried_message = update.message.is_some();
        if let Some(text) = update.message {
            let entry = MessageEntry::new(
                update.sender.unwrap_or(Sender::Bot),
                text,
                Utc::now(),
            )
            .with_options(update.options)
            .with_file(update.file_url);
            cx.push_and_render(entry);
        }
        match update.status {
            Some(ChatStatus::Closed) => {
                cx.transcript.set_status(ChatStatus::Closed);
                if !carried_message {
                    let text = cx
                        .config
                        .phrase("This conversation has been closed.")
                        .to_owned();
                    cx.push_and_render(MessageEntry::new(Sender::Bot, text, Utc::now()));
                }
                cx.sync_input();
            }
            Some(ChatStatus::Open) => {
                cx.transcript.set_status(ChatStatus::Open);
                cx.sync_input();
            }
            None => {
                if carried_message {
                    cx.sync_input();
                }
            }
        }
    }
}
