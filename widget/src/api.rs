//! Backend REST endpoints consumed by the widget.

use async_trait::async_trait;
use supportchat_protocol::rest::{
    Article, ArticleBody, ChatHistory, ChatSummary, CountryInfo, FaqList, UploadResponse,
};
use supportchat_protocol::{ArticleId, ConversationId, TenantCode};

/// One file attached to an outgoing message.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Request/response surface of the chat backend.
#[async_trait]
pub trait SupportApi: Send + Sync {
    async fn chat_history(&self, chat: &ConversationId) -> crate::Result<ChatHistory>;
    async fn chats(&self, tenant: &TenantCode, email: &str) -> crate::Result<Vec<ChatSummary>>;
    async fn articles(&self, tenant: &TenantCode) -> crate::Result<Vec<Article>>;
    async fn article_body(
        &self,
        tenant: &TenantCode,
        article: &ArticleId,
    ) -> crate::Result<ArticleBody>;
    /// Uploads attachments for a conversation, returning the stored URL.
    async fn upload(&self, chat: &ConversationId, files: Vec<UploadFile>) -> crate::Result<String>;
}

/// [`SupportApi`] implementation backed by the hosted chat backend.
pub struct HttpSupportApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSupportApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SupportApi for HttpSupportApi {
    async fn chat_history(&self, chat: &ConversationId) -> crate::Result<ChatHistory> {
        let response = self
            .client
            .get(self.url(&format!("/api/chats/{chat}")))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn chats(&self, tenant: &TenantCode, email: &str) -> crate::Result<Vec<ChatSummary>> {
        let response = self
            .client
            .get(self.url(&format!("/api/chats/{tenant}/{email}")))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn articles(&self, tenant: &TenantCode) -> crate::Result<Vec<Article>> {
        let response = self
            .client
            .get(self.url(&format!("/api/websites/faqs/{tenant}")))
            .send()
            .await?
            .error_for_status()?;
        let list: FaqList = response.json().await?;
        Ok(list.faqs)
    }

    async fn article_body(
        &self,
        tenant: &TenantCode,
        article: &ArticleId,
    ) -> crate::Result<ArticleBody> {
        let response = self
            .client
            .get(self.url(&format!("/api/websites/faqs/{tenant}/{article}")))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn upload(&self, chat: &ConversationId, files: Vec<UploadFile>) -> crate::Result<String> {
        let mut form = reqwest::multipart::Form::new().text("chatId", chat.0.clone());
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&file.content_type)?;
            form = form.part("media", part);
        }
        let response = self
            .client
            .post(self.url("/api/files"))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        let payload: UploadResponse = response.json().await?;
        Ok(payload.data.url)
    }
}

/// Country tagging for newly created conversations. The geolocation lookup
/// itself is an external collaborator; embeddings plug their own in.
#[async_trait]
pub trait CountryLookup: Send + Sync {
    async fn current(&self) -> CountryInfo;
}

/// Default lookup that tags no country.
pub struct NoCountry;

#[async_trait]
impl CountryLookup for NoCountry {
    async fn current(&self) -> CountryInfo {
        CountryInfo::default()
    }
}
