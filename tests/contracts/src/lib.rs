//! Shared fixtures for the widget contract tests: a scripted backend, a
//! capturing realtime channel and a capturing host frame, wired into a fully
//! booted widget.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use supportchat_protocol::config::WidgetConfig;
use supportchat_protocol::events::{ClientEvent, ConnectParams, ServerEvent};
use supportchat_protocol::frame::{InboundFrame, OutboundFrame};
use supportchat_protocol::rest::{Article, ArticleBody, ChatHistory, ChatSummary};
use supportchat_protocol::{ArticleId, ChatStatus, ConversationId, TenantCode};
use supportchat_widget::api::{NoCountry, SupportApi, UploadFile};
use supportchat_widget::effects::{EffectSink, UiEffect};
use supportchat_widget::handshake::HostFrame;
use supportchat_widget::markdown::PassthroughMarkdown;
use supportchat_widget::storage::MemoryStore;
use supportchat_widget::stream::{RealtimeChannel, RealtimeConnection, RealtimeConnector};
use supportchat_widget::{SupportWidget, WidgetDeps, WidgetError};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Test logging, opt-in via `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// Host frame that records everything the widget posts.
#[derive(Clone, Default)]
pub struct CapturingFrame {
    pub posted: Arc<Mutex<Vec<OutboundFrame>>>,
}

impl HostFrame for CapturingFrame {
    fn post(&self, frame: OutboundFrame) {
        self.posted.lock().unwrap().push(frame);
    }
}

/// Realtime channel that records every emitted event.
#[derive(Clone, Default)]
pub struct CapturingChannel {
    pub emitted: Arc<Mutex<Vec<ClientEvent>>>,
}

impl RealtimeChannel for CapturingChannel {
    fn emit(&self, event: ClientEvent) -> supportchat_widget::Result<()> {
        self.emitted.lock().unwrap().push(event);
        Ok(())
    }
}

/// Connector handing out one prepared connection.
pub struct StubConnector {
    connection: Mutex<Option<RealtimeConnection>>,
    pub params_seen: Arc<Mutex<Vec<ConnectParams>>>,
}

impl StubConnector {
    pub fn new(connection: RealtimeConnection) -> Self {
        Self {
            connection: Mutex::new(Some(connection)),
            params_seen: Arc::default(),
        }
    }
}

#[async_trait]
impl RealtimeConnector for StubConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
    ) -> supportchat_widget::Result<RealtimeConnection> {
        self.params_seen.lock().unwrap().push(params.clone());
        self.connection
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| WidgetError::Realtime("connection already taken".into()))
    }
}

/// Programmable backend standing in for the REST API.
pub struct ScriptedApi {
    pub histories: Mutex<HashMap<String, ChatHistory>>,
    pub chats: Mutex<Vec<ChatSummary>>,
    pub articles: Mutex<Vec<Article>>,
    pub bodies: Mutex<HashMap<String, String>>,
    /// `Err` aborts uploads; `Ok` is the stored attachment URL.
    pub upload: Mutex<Result<String, String>>,
    pub fail_history: Mutex<bool>,
    pub fail_chats: Mutex<bool>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            histories: Mutex::default(),
            chats: Mutex::default(),
            articles: Mutex::default(),
            bodies: Mutex::default(),
            upload: Mutex::new(Ok("https://cdn.example/upload.png".into())),
            fail_history: Mutex::new(false),
            fail_chats: Mutex::new(false),
        }
    }
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(self, id: &str, history: ChatHistory) -> Self {
        self.histories.lock().unwrap().insert(id.into(), history);
        self
    }

    pub fn with_chats(self, chats: Vec<ChatSummary>) -> Self {
        *self.chats.lock().unwrap() = chats;
        self
    }

    pub fn with_articles(self, articles: Vec<Article>) -> Self {
        *self.articles.lock().unwrap() = articles;
        self
    }

    pub fn with_body(self, id: &str, answer: &str) -> Self {
        self.bodies.lock().unwrap().insert(id.into(), answer.into());
        self
    }

    pub fn with_failing_upload(self, message: &str) -> Self {
        *self.upload.lock().unwrap() = Err(message.into());
        self
    }
}

#[async_trait]
impl SupportApi for ScriptedApi {
    async fn chat_history(&self, chat: &ConversationId) -> supportchat_widget::Result<ChatHistory> {
        if *self.fail_history.lock().unwrap() {
            return Err(WidgetError::Api("history unavailable".into()));
        }
        self.histories
            .lock()
            .unwrap()
            .get(chat.as_str())
            .cloned()
            .ok_or_else(|| WidgetError::Api(format!("no such chat: {chat}")))
    }

    async fn chats(
        &self,
        _tenant: &TenantCode,
        _email: &str,
    ) -> supportchat_widget::Result<Vec<ChatSummary>> {
        if *self.fail_chats.lock().unwrap() {
            return Err(WidgetError::Api("chat list unavailable".into()));
        }
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn articles(&self, _tenant: &TenantCode) -> supportchat_widget::Result<Vec<Article>> {
        Ok(self.articles.lock().unwrap().clone())
    }

    async fn article_body(
        &self,
        _tenant: &TenantCode,
        article: &ArticleId,
    ) -> supportchat_widget::Result<ArticleBody> {
        self.bodies
            .lock()
            .unwrap()
            .get(article.as_str())
            .map(|answer| ArticleBody {
                answer: answer.clone(),
            })
            .ok_or_else(|| WidgetError::Api(format!("no such article: {article}")))
    }

    async fn upload(
        &self,
        _chat: &ConversationId,
        _files: Vec<UploadFile>,
    ) -> supportchat_widget::Result<String> {
        self.upload
            .lock()
            .unwrap()
            .clone()
            .map_err(WidgetError::Upload)
    }
}

/// A booted widget plus handles on every collaborator.
pub struct Harness {
    pub widget: SupportWidget,
    pub api: Arc<ScriptedApi>,
    pub frame: CapturingFrame,
    pub channel: CapturingChannel,
    pub effects: mpsc::UnboundedReceiver<UiEffect>,
    pub store: MemoryStore,
    /// Feed for the widget's `run` loop; unused when events are applied
    /// directly.
    pub server_tx: mpsc::UnboundedSender<ServerEvent>,
}

impl Harness {
    /// Collects every effect emitted so far.
    pub fn drain(&mut self) -> Vec<UiEffect> {
        let mut effects = Vec::new();
        while let Ok(effect) = self.effects.try_recv() {
            effects.push(effect);
        }
        effects
    }

    pub fn emitted(&self) -> Vec<ClientEvent> {
        self.channel.emitted.lock().unwrap().clone()
    }

    pub fn posted(&self) -> Vec<OutboundFrame> {
        self.frame.posted.lock().unwrap().clone()
    }
}

pub fn test_config() -> WidgetConfig {
    serde_json::from_value(serde_json::json!({
        "backendUrl": "https://backend.example",
        "socketIoUrl": "https://realtime.example",
        "chatbotCode": "acme",
        "headerText": "Acme Support",
    }))
    .unwrap()
}

pub fn ts(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).unwrap()
}

pub fn summary(id: &str, status: ChatStatus, updated_s: i64) -> ChatSummary {
    ChatSummary {
        id: id.into(),
        name: format!("Conversation {id}"),
        status,
        created_at: ts(updated_s - 3600),
        updated_at: ts(updated_s),
    }
}

pub fn article(id: &str, title: &str, description: &str) -> Article {
    Article {
        id: id.into(),
        title: title.into(),
        description: description.into(),
    }
}

pub fn history(status: ChatStatus, messages: serde_json::Value) -> ChatHistory {
    serde_json::from_value(serde_json::json!({
        "status": status,
        "messages": messages,
    }))
    .unwrap()
}

pub async fn boot(api: ScriptedApi) -> Harness {
    boot_with(api, MemoryStore::default(), test_config()).await
}

/// Boots a widget against in-memory collaborators, answering the handshake
/// immediately.
pub async fn boot_with(api: ScriptedApi, store: MemoryStore, config: WidgetConfig) -> Harness {
    let api = Arc::new(api);
    let frame = CapturingFrame::default();
    let channel = CapturingChannel::default();
    let (effects, effects_rx) = EffectSink::channel();

    let (frame_tx, frames_in) = mpsc::unbounded_channel();
    frame_tx
        .send(InboundFrame::Config { config })
        .expect("handshake frame");

    let (server_tx, server_rx) = mpsc::unbounded_channel();
    let connector = StubConnector::new(RealtimeConnection {
        channel: Box::new(channel.clone()),
        events: server_rx,
    });

    let deps = WidgetDeps {
        frame: Box::new(frame.clone()),
        frames_in,
        connector: Box::new(connector),
        api: api.clone(),
        store: Box::new(store.clone()),
        markdown: Box::new(PassthroughMarkdown),
        country: Box::new(NoCountry),
        page_url: "https://example.com/pricing".into(),
    };

    let widget = SupportWidget::start(deps, effects)
        .await
        .expect("widget boots");

    Harness {
        widget,
        api,
        frame,
        channel,
        effects: effects_rx,
        store,
        server_tx,
    }
}
