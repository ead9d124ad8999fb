//! Typed UI effects consumed by the embedding shell.
//!
//! The widget never touches the DOM; it describes every rendering step as a
//! value on this channel and the shell applies them in order.

use crate::markdown::MarkdownConverter;
use crate::router::{Direction, HeaderState, Tab, View};
use crate::transcript::MessageEntry;
use chrono::{DateTime, Utc};
use supportchat_protocol::config::{Theme, WidgetConfig};
use supportchat_protocol::events::{AvatarKind, BubbleAlignment, Presentable, Sender};
use supportchat_protocol::rest::{Article, ChatSummary};
use tokio::sync::mpsc;

/// One message bubble, fully resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub sender: Sender,
    pub label: String,
    pub html: String,
    pub timestamp: DateTime<Utc>,
    pub options: Vec<String>,
    pub replied: bool,
    pub file_url: Option<String>,
    pub alignment: BubbleAlignment,
    pub avatar: AvatarKind,
}

impl RenderedMessage {
    pub fn new(
        entry: &MessageEntry,
        config: &WidgetConfig,
        markdown: &dyn MarkdownConverter,
    ) -> Self {
        let label = match (&entry.sender, entry.sender.label_key()) {
            (Sender::Staff(name), _) => name.clone(),
            (_, Some(key)) => config.phrase(key).to_owned(),
            (_, None) => String::new(),
        };
        Self {
            sender: entry.sender.clone(),
            label,
            html: markdown.to_html(&entry.text),
            timestamp: entry.timestamp,
            options: entry.options.clone(),
            replied: entry.replied,
            file_url: entry.file_url.clone(),
            alignment: entry.sender.alignment(),
            avatar: entry.sender.avatar(),
        }
    }
}

/// Instructions for the embedding shell.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEffect {
    ApplyTheme {
        theme: Theme,
        gradient1: String,
        gradient2: String,
    },
    SetActiveTab(Tab),
    SetHeaderVisible(bool),
    /// Fade every visible view region out toward `direction`.
    FadeOutViews { direction: Direction },
    /// Mount the target view offset toward `direction`, still transparent.
    MountView {
        view: View,
        direction: Direction,
        header: HeaderState,
    },
    /// Bring the mounted view to its steady state.
    SettleView { view: View },
    /// Fade the view's footer in.
    ShowFooter { view: View },
    SetInputVisible(bool),
    ShowTypingIndicator,
    HideTypingIndicator,
    ClearTranscript,
    RenderMessage(RenderedMessage),
    /// Disable every quick-reply option block currently rendered.
    MarkOptionsReplied,
    RenderConversationList(Vec<ChatSummary>),
    RenderArticleList(Vec<Article>),
    ResetArticleSearch,
    RenderArticleBody { html: String },
    OpenUrl { url: String, new_tab: bool },
    /// The email form was submitted empty; flash its validation state.
    EmailRejected,
}

/// Sending half of the effect channel; clones share the same shell.
#[derive(Clone)]
pub struct EffectSink(mpsc::UnboundedSender<UiEffect>);

impl EffectSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEffect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    /// Sends one effect. A detached shell discards effects silently.
    pub fn emit(&self, effect: UiEffect) {
        let _ = self.0.send(effect);
    }
}
