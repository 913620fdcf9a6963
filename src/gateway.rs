//! REST gateway and the backend abstraction
//!
//! `ChatBackend` is the seam between the session state machine and the
//! network; `HttpGateway` is the production implementation over reqwest.

use crate::error::ChatError;
use crate::model::Conversation;
use crate::protocol::{ChatRequest, ChatResponse, DeleteResponse};
use crate::transport::{EventStream, StreamTransport};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Page window for the conversation summary list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListPage {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Backend surface consumed by a chat session
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Single round-trip send: the response carries the final message
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError>;

    /// Streaming send: yields incremental events until a terminal one
    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, ChatError>;

    /// Conversation summaries, newest first, without message bodies
    async fn list_conversations(&self, page: ListPage) -> Result<Vec<Conversation>, ChatError>;

    /// One conversation with its full ordered message sequence
    async fn conversation_detail(&self, id: &str) -> Result<Conversation, ChatError>;

    /// Returns the server's success flag
    async fn delete_conversation(&self, id: &str) -> Result<bool, ChatError>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        (**self).send_message(request).await
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, ChatError> {
        (**self).open_stream(request).await
    }

    async fn list_conversations(&self, page: ListPage) -> Result<Vec<Conversation>, ChatError> {
        (**self).list_conversations(page).await
    }

    async fn conversation_detail(&self, id: &str) -> Result<Conversation, ChatError> {
        (**self).conversation_detail(id).await
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, ChatError> {
        (**self).delete_conversation(id).await
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL including any path prefix, e.g. `http://127.0.0.1:8000/api`
    pub base_url: String,
    /// Total timeout for non-streaming calls
    pub request_timeout: Duration,
    /// Inactivity window for the streaming body
    pub stream_idle_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            request_timeout: Duration::from_secs(120),
            stream_idle_timeout: Duration::from_secs(120),
        }
    }
}

/// HTTP implementation of [`ChatBackend`]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    transport: StreamTransport,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Self {
        // No client-wide total timeout: it would also bound the streaming
        // body, which is governed by the idle window instead. Non-streaming
        // calls get the total timeout per request.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let transport = StreamTransport::new(
            client.clone(),
            format!("{base_url}/chat/stream"),
            config.stream_idle_timeout,
        );

        Self {
            client,
            base_url,
            request_timeout: config.request_timeout,
            transport,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn classify_send_error(e: &reqwest::Error) -> ChatError {
        if e.is_timeout() {
            ChatError::timeout(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            ChatError::transport(format!("Connection failed: {e}"))
        } else {
            ChatError::transport(format!("Request failed: {e}"))
        }
    }

    fn classify_status(status: reqwest::StatusCode, body: &str) -> ChatError {
        let message = match status.as_u16() {
            401 | 403 => format!("Authentication failed: {body}"),
            404 => format!("Not found: {body}"),
            429 => format!("Rate limited: {body}"),
            400 => format!("Invalid request: {body}"),
            500..=599 => format!("Server error: {body}"),
            _ => format!("HTTP {status}: {body}"),
        };
        ChatError::transport(message).with_status(status.as_u16())
    }

    /// Issue one non-streaming request and decode a JSON body.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ChatError> {
        let response = builder
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ChatError::transport(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl ChatBackend for HttpGateway {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        self.execute_json(self.client.post(self.url("/chat/message")).json(request))
            .await
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, ChatError> {
        self.transport.open(request).await
    }

    async fn list_conversations(&self, page: ListPage) -> Result<Vec<Conversation>, ChatError> {
        let mut builder = self.client.get(self.url("/chat/conversations"));
        if let Some(limit) = page.limit {
            builder = builder.query(&[("limit", limit)]);
        }
        if let Some(offset) = page.offset {
            builder = builder.query(&[("offset", offset)]);
        }
        self.execute_json(builder)
            .await
            .map_err(ChatError::into_directory)
    }

    async fn conversation_detail(&self, id: &str) -> Result<Conversation, ChatError> {
        self.execute_json(self.client.get(self.url(&format!("/chat/conversations/{id}"))))
            .await
            .map_err(ChatError::into_directory)
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, ChatError> {
        let response: DeleteResponse = self
            .execute_json(
                self.client
                    .delete(self.url(&format!("/chat/conversations/{id}"))),
            )
            .await
            .map_err(ChatError::into_directory)?;
        Ok(response.success)
    }
}
