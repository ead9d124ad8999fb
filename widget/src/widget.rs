//! The widget orchestrator: wires the handshake, session, router, transcript
//! and realtime stream together and exposes the user-facing operations.

use crate::api::{CountryLookup, SupportApi, UploadFile};
use crate::effects::{EffectSink, RenderedMessage, UiEffect};
use crate::error::WidgetError;
use crate::handshake::{ConfigChannel, HostFrame};
use crate::markdown::MarkdownConverter;
use crate::router::{Direction, HeaderProps, Tab, View, ViewRouter};
use crate::session::SessionContext;
use crate::storage::StateStore;
use crate::stream::{MessageStream, RealtimeConnector, StreamCx};
use crate::transcript::{MessageEntry, Transcript};
use chrono::Utc;
use std::sync::Arc;
use supportchat_protocol::config::WidgetConfig;
use supportchat_protocol::events::{ConnectParams, Sender, ServerEvent};
use supportchat_protocol::frame::{InboundFrame, OutboundFrame};
use supportchat_protocol::rest::{Article, ChatHistory, ChatSummary};
use supportchat_protocol::{ArticleId, ChatStatus, ConversationId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// External collaborators handed to the widget at startup.
pub struct WidgetDeps {
    pub frame: Box<dyn HostFrame>,
    /// Messages posted by the host page. Only consumed during the handshake;
    /// later frames are dropped.
    pub frames_in: mpsc::UnboundedReceiver<InboundFrame>,
    pub connector: Box<dyn RealtimeConnector>,
    pub api: Arc<dyn SupportApi>,
    pub store: Box<dyn StateStore>,
    pub markdown: Box<dyn MarkdownConverter>,
    pub country: Box<dyn CountryLookup>,
    /// URL of the page embedding the widget.
    pub page_url: String,
}

/// User input forwarded by the embedding shell.
#[derive(Debug)]
pub enum UserAction {
    ToggleWidget,
    SwitchTab(Tab),
    SubmitEmail(String),
    OpenConversation(ConversationId),
    BackToConversations,
    BackToArticles,
    StartNewChat,
    SendMessage {
        text: String,
        files: Vec<UploadFile>,
    },
    SelectQuickReply(String),
    OpenArticle(ArticleId),
    SearchArticles(String),
    DeepLink(String),
}

/// The client-side session/view state machine.
///
/// All work runs on one logical task; concurrency is interleaved async
/// completions, never parallel execution. Cross-await consistency is kept by
/// captured-id staleness guards and the router's transition epoch latch, not
/// by luck of scheduling.
pub struct SupportWidget {
    pub(crate) config: Arc<WidgetConfig>,
    pub(crate) session: SessionContext,
    pub(crate) transcript: Transcript,
    pub(crate) router: ViewRouter,
    pub(crate) stream: MessageStream,
    pub(crate) api: Arc<dyn SupportApi>,
    pub(crate) frame: Box<dyn HostFrame>,
    pub(crate) markdown: Box<dyn MarkdownConverter>,
    pub(crate) country: Box<dyn CountryLookup>,
    pub(crate) effects: EffectSink,
    pub(crate) articles: Vec<Article>,
    server_events: Option<mpsc::UnboundedReceiver<ServerEvent>>,
}

impl SupportWidget {
    /// Boots the widget: seeds the session from storage, negotiates the
    /// configuration with the host page, connects the realtime channel and
    /// renders the initial view.
    pub async fn start(deps: WidgetDeps, effects: EffectSink) -> crate::Result<Self> {
        let WidgetDeps {
            frame,
            mut frames_in,
            connector,
            api,
            store,
            markdown,
            country,
            page_url,
        } = deps;

        let session = SessionContext::restore(store)?;
        let config = Arc::new(
            ConfigChannel::new()
                .negotiate(frame.as_ref(), &mut frames_in)
                .await?,
        );
        info!(tenant = %config.chatbot_code, "widget configured");
        effects.emit(UiEffect::ApplyTheme {
            theme: config.theme,
            gradient1: config.gradient1.clone(),
            gradient2: config.gradient2.clone(),
        });
        frame.post(OutboundFrame::Initialized);

        let params = ConnectParams {
            chatbot_code: config.chatbot_code.clone(),
            current_website_url: page_url.clone(),
        };
        let connection = connector.connect(&params).await?;
        let stream = MessageStream::new(connection.channel, config.chatbot_code.clone(), page_url);

        let articles = match api.articles(&config.chatbot_code).await {
            Ok(articles) => articles,
            Err(error) => {
                warn!(%error, "failed to load help articles");
                Vec::new()
            }
        };

        let router = ViewRouter::new(Arc::clone(&config), effects.clone());
        let mut widget = Self {
            config,
            session,
            transcript: Transcript::new(),
            router,
            stream,
            api,
            frame,
            markdown,
            country,
            effects,
            articles,
            server_events: Some(connection.events),
        };

        if !widget.config.tabs_mode {
            widget.router.force_tab(&mut widget.session, Tab::Messages);
        }
        let initial = if widget.session.email().is_some() {
            View::Conversations
        } else {
            View::Email
        };
        widget
            .router
            .show(
                &mut widget.session,
                initial,
                Direction::Right,
                HeaderProps::default(),
            )
            .await;
        if widget.session.email().is_some() {
            widget.reload_chats().await;
        }
        if widget.config.auto_open {
            widget.toggle_widget().await?;
        }
        Ok(widget)
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Drives the widget from the realtime channel and a stream of user
    /// actions until either side closes.
    pub async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<UserAction>,
    ) -> crate::Result<()> {
        let mut events = self
            .server_events
            .take()
            .ok_or(WidgetError::ChannelClosed)?;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.apply_server_event(event),
                    None => break,
                },
                action = actions.recv() => match action {
                    Some(action) => self.handle_action(action).await,
                    None => break,
                },
            }
        }
        Ok(())
    }

    /// Dispatches one user action; failures are local and logged.
    pub async fn handle_action(&mut self, action: UserAction) {
        let result = match action {
            UserAction::ToggleWidget => self.toggle_widget().await,
            UserAction::SwitchTab(tab) => self.switch_tab(tab).await,
            UserAction::SubmitEmail(email) => self.submit_email(&email).await,
            UserAction::OpenConversation(id) => self.open_conversation(id).await,
            UserAction::BackToConversations => self.back_to_conversations().await,
            UserAction::BackToArticles => self.back_to_articles().await,
            UserAction::StartNewChat => self.start_new_chat().await,
            UserAction::SendMessage { text, files } => self.send_message(&text, files).await,
            UserAction::SelectQuickReply(option) => self.select_quick_reply(&option),
            UserAction::OpenArticle(id) => self.open_article(&id).await,
            UserAction::SearchArticles(query) => {
                self.search_articles(&query);
                Ok(())
            }
            UserAction::DeepLink(raw) => {
                self.handle_deep_link(&raw).await;
                Ok(())
            }
        };
        if let Err(error) = result {
            warn!(%error, "widget action failed");
        }
    }

    /// Applies one inbound realtime event. Events are applied strictly in
    /// delivery order.
    pub fn apply_server_event(&mut self, event: ServerEvent) {
        let mut cx = StreamCx {
            session: &mut self.session,
            transcript: &mut self.transcript,
            effects: &self.effects,
            config: &self.config,
            markdown: self.markdown.as_ref(),
        };
        if let Err(error) = self.stream.apply(event, &mut cx) {
            warn!(%error, "failed to apply realtime event");
        }
    }

    /// Collapses or expands the widget, notifying the host frame of the
    /// desired iframe size.
    pub async fn toggle_widget(&mut self) -> crate::Result<()> {
        if self.session.expanded {
            self.router
                .set_expanded(&mut self.session, self.frame.as_ref(), false);
            return Ok(());
        }
        self.router
            .set_expanded(&mut self.session, self.frame.as_ref(), true);
        if self.session.email().is_none() {
            self.router
                .show(
                    &mut self.session,
                    View::Email,
                    Direction::Right,
                    HeaderProps::default(),
                )
                .await;
        } else {
            self.router
                .show(
                    &mut self.session,
                    View::Conversations,
                    Direction::Right,
                    HeaderProps::default(),
                )
                .await;
            self.reload_chats().await;
        }
        Ok(())
    }

    pub async fn switch_tab(&mut self, tab: Tab) -> crate::Result<()> {
        if !self.config.tabs_mode {
            return Ok(());
        }
        self.router.force_tab(&mut self.session, tab);
        match tab {
            Tab::Home => {}
            Tab::Help => {
                self.router
                    .show(
                        &mut self.session,
                        View::Articles,
                        Direction::Left,
                        HeaderProps::default(),
                    )
                    .await;
                self.effects.emit(UiEffect::ResetArticleSearch);
                self.effects
                    .emit(UiEffect::RenderArticleList(self.articles.clone()));
            }
            Tab::Messages => {
                if self.session.email().is_some() {
                    // Stay in an open chat; otherwise land on the list.
                    if self.session.current_view != View::Chat {
                        self.router
                            .show(
                                &mut self.session,
                                View::Conversations,
                                Direction::Right,
                                HeaderProps::default(),
                            )
                            .await;
                    }
                } else {
                    self.router
                        .show(
                            &mut self.session,
                            View::Email,
                            Direction::Right,
                            HeaderProps::default(),
                        )
                        .await;
                }
            }
        }
        Ok(())
    }

    /// Persists the visitor email and moves on to the conversation list. An
    /// empty submission is rejected with an inline validation effect.
    pub async fn submit_email(&mut self, email: &str) -> crate::Result<()> {
        let email = email.trim();
        if email.is_empty() {
            self.effects.emit(UiEffect::EmailRejected);
            return Ok(());
        }
        self.session.set_email(email.to_owned())?;
        self.router
            .show(
                &mut self.session,
                View::Conversations,
                Direction::Right,
                HeaderProps::default(),
            )
            .await;
        self.reload_chats().await;
        Ok(())
    }

    /// Opens an existing conversation: joins its room, loads its history and
    /// switches to the chat view.
    pub async fn open_conversation(&mut self, id: ConversationId) -> crate::Result<()> {
        self.session.set_active_chat(Some(id.clone()))?;
        self.stream.join_chat(&id)?;
        let result = self.api.chat_history(&id).await;
        self.apply_chat_history(id.clone(), result);
        if self.session.active_chat() == Some(&id) {
            self.router
                .show(
                    &mut self.session,
                    View::Chat,
                    Direction::Right,
                    HeaderProps::default(),
                )
                .await;
        }
        Ok(())
    }

    /// Applies a finished history fetch for `target`.
    ///
    /// Staleness guard: the response is discarded when the active
    /// conversation changed while the request was in flight.
    pub fn apply_chat_history(
        &mut self,
        target: ConversationId,
        result: crate::Result<ChatHistory>,
    ) {
        if self.session.active_chat() != Some(&target) {
            debug!(chat = %target, "discarding stale history response");
            return;
        }
        match result {
            Ok(history) => {
                self.effects.emit(UiEffect::ClearTranscript);
                self.transcript.load(history.messages, history.status);
                if self.session.typing {
                    self.session.typing = false;
                    self.effects.emit(UiEffect::HideTypingIndicator);
                }
                for entry in self.transcript.entries() {
                    self.effects.emit(UiEffect::RenderMessage(RenderedMessage::new(
                        entry,
                        &self.config,
                        self.markdown.as_ref(),
                    )));
                }
                self.sync_input_visibility();
            }
            Err(error) => {
                warn!(%error, "failed to load chat history");
                self.system_notice("Error loading chat history.");
            }
        }
    }

    /// Back navigation from the chat view: clears the active conversation
    /// and returns to the list.
    pub async fn back_to_conversations(&mut self) -> crate::Result<()> {
        self.session.set_active_chat(None)?;
        if self.session.typing {
            self.session.typing = false;
            self.effects.emit(UiEffect::HideTypingIndicator);
        }
        self.transcript.clear();
        self.effects.emit(UiEffect::ClearTranscript);
        self.sync_input_visibility();
        if self.session.email().is_none() {
            self.router
                .show(
                    &mut self.session,
                    View::Email,
                    Direction::Right,
                    HeaderProps::default(),
                )
                .await;
        } else {
            self.router
                .show(
                    &mut self.session,
                    View::Conversations,
                    Direction::Left,
                    HeaderProps::default(),
                )
                .await;
            self.reload_chats().await;
        }
        Ok(())
    }

    pub async fn back_to_articles(&mut self) -> crate::Result<()> {
        self.router
            .show(
                &mut self.session,
                View::Articles,
                Direction::Left,
                HeaderProps::default(),
            )
            .await;
        Ok(())
    }

    /// Starts a fresh conversation over the realtime channel. The backend
    /// answers with `new_chat_data`, which activates the new conversation.
    pub async fn start_new_chat(&mut self) -> crate::Result<()> {
        let Some(email) = self.session.email().map(str::to_owned) else {
            debug!("new chat ignored: no visitor email yet");
            return Ok(());
        };
        self.transcript.clear();
        self.effects.emit(UiEffect::ClearTranscript);
        self.sync_input_visibility();
        self.router
            .show(
                &mut self.session,
                View::Chat,
                Direction::Right,
                HeaderProps::default(),
            )
            .await;
        let country = self.country.current().await;
        if let Err(error) = self.stream.create_new_chat(&email, country) {
            warn!(%error, "failed to start a new conversation");
            if self.session.typing {
                self.session.typing = false;
                self.effects.emit(UiEffect::HideTypingIndicator);
            }
            self.system_notice("Error starting a new chat.");
        }
        Ok(())
    }

    /// Sends a visitor message, uploading attachments first.
    ///
    /// An upload failure aborts the send before any state is touched, so the
    /// caller keeps the draft for retry.
    pub async fn send_message(&mut self, text: &str, files: Vec<UploadFile>) -> crate::Result<()> {
        let Some(chat) = self.session.active_chat().cloned() else {
            debug!("send ignored: no active conversation");
            return Ok(());
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let mut file_url = None;
        if !files.is_empty() {
            match self.api.upload(&chat, files).await {
                Ok(url) => file_url = Some(url),
                Err(error) => {
                    warn!(%error, "file upload failed");
                    self.system_notice("Error uploading file(s).");
                    return Err(error);
                }
            }
            if self.session.active_chat() != Some(&chat) {
                debug!("discarding send: conversation changed during upload");
                return Ok(());
            }
        }

        if self.session.typing {
            self.session.typing = false;
            self.effects.emit(UiEffect::HideTypingIndicator);
        }
        self.transcript.mark_options_replied();
        self.effects.emit(UiEffect::MarkOptionsReplied);

        let entry =
            MessageEntry::new(Sender::Visitor, text, Utc::now()).with_file(file_url.clone());
        self.render_and_push(entry);
        let email = self.session.email().unwrap_or_default().to_owned();
        self.stream.send_message(&chat, &email, text, file_url)?;
        self.sync_input_visibility();
        Ok(())
    }

    /// Answers the pending quick-reply options block with one of its options.
    pub fn select_quick_reply(&mut self, option: &str) -> crate::Result<()> {
        let Some(chat) = self.session.active_chat().cloned() else {
            return Ok(());
        };
        self.transcript.mark_options_replied();
        self.effects.emit(UiEffect::MarkOptionsReplied);
        let entry = MessageEntry::new(Sender::Visitor, option, Utc::now());
        self.render_and_push(entry);
        let email = self.session.email().unwrap_or_default().to_owned();
        self.stream.send_message(&chat, &email, option, None)?;
        self.sync_input_visibility();
        Ok(())
    }

    /// Opens one help article: shows its content view and fetches the body.
    pub async fn open_article(&mut self, id: &ArticleId) -> crate::Result<()> {
        let Some(article) = self.articles.iter().find(|a| &a.id == id).cloned() else {
            warn!(article = %id, "article not found; falling back to the article list");
            self.router
                .show(
                    &mut self.session,
                    View::Articles,
                    Direction::Left,
                    HeaderProps::default(),
                )
                .await;
            return Ok(());
        };
        let props = HeaderProps {
            title: article.title.clone(),
            description: article.description.clone(),
        };
        self.router
            .show(&mut self.session, View::ArticleContent, Direction::Right, props)
            .await;
        match self.api.article_body(&self.config.chatbot_code, id).await {
            Ok(body) => {
                let html = self.markdown.to_html(&body.answer);
                self.effects.emit(UiEffect::RenderArticleBody { html });
            }
            Err(error) => warn!(%error, "failed to load article body"),
        }
        Ok(())
    }

    /// Case-insensitive substring filter over article titles and
    /// descriptions.
    pub fn search_articles(&mut self, query: &str) {
        let query = query.to_lowercase();
        let filtered: Vec<Article> = self
            .articles
            .iter()
            .filter(|article| {
                article.title.to_lowercase().contains(&query)
                    || article.description.to_lowercase().contains(&query)
            })
            .cloned()
            .collect();
        self.effects.emit(UiEffect::RenderArticleList(filtered));
    }

    async fn reload_chats(&mut self) {
        let Some(email) = self.session.email().map(str::to_owned) else {
            return;
        };
        let result = self.api.chats(&self.config.chatbot_code, &email).await;
        self.apply_chat_list(result);
    }

    /// Applies a finished conversation-list fetch: newest first, and when no
    /// conversation is active the most recent open one is selected (and
    /// persisted) without navigating.
    pub fn apply_chat_list(&mut self, result: crate::Result<Vec<ChatSummary>>) {
        match result {
            Ok(mut chats) => {
                chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                if self.session.active_chat().is_none() {
                    if let Some(open) = chats.iter().find(|c| c.status == ChatStatus::Open) {
                        if let Err(error) = self.session.set_active_chat(Some(open.id.clone())) {
                            warn!(%error, "failed to persist auto-selected conversation");
                        }
                    }
                }
                self.effects.emit(UiEffect::RenderConversationList(chats));
            }
            Err(error) => {
                warn!(%error, "failed to load conversations");
                self.system_notice("Error loading your chats.");
            }
        }
    }

    pub(crate) fn render_and_push(&mut self, entry: MessageEntry) {
        self.effects.emit(UiEffect::RenderMessage(RenderedMessage::new(
            &entry,
            &self.config,
            self.markdown.as_ref(),
        )));
        self.transcript.push(entry);
    }

    /// Renders a translated one-off notice without touching transcript state.
    pub(crate) fn system_notice(&mut self, key: &str) {
        let entry = MessageEntry::new(Sender::Bot, self.config.phrase(key).to_owned(), Utc::now());
        self.effects.emit(UiEffect::RenderMessage(RenderedMessage::new(
            &entry,
            &self.config,
            self.markdown.as_ref(),
        )));
    }

    pub(crate) fn sync_input_visibility(&mut self) {
        let visible = self.transcript.input_visible();
        self.session.input_visible = visible;
        self.effects.emit(UiEffect::SetInputVisible(visible));
    }
}
