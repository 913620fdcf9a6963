//! Scripted backend for session tests
//!
//! Queues responses per endpoint, the way the network would deliver them.
//! Scripted stream events are encoded back into wire frames so every test
//! exercises the real decoder and transport machinery.

use crate::error::ChatError;
use crate::gateway::{ChatBackend, ListPage};
use crate::model::Conversation;
use crate::protocol::{ChatRequest, ChatResponse, StreamEvent};
use crate::transport::EventStream;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted streaming send: decoded events interleaved with optional
/// mid-stream transport failures.
pub type StreamScript = Vec<Result<StreamEvent, ChatError>>;

pub struct ScriptedBackend {
    streams: Mutex<VecDeque<Result<StreamScript, ChatError>>>,
    responses: Mutex<VecDeque<Result<ChatResponse, ChatError>>>,
    lists: Mutex<VecDeque<Result<Vec<Conversation>, ChatError>>>,
    details: Mutex<VecDeque<Result<Conversation, ChatError>>>,
    deletes: Mutex<VecDeque<Result<bool, ChatError>>>,
    /// Requests seen by either send path
    pub requests: Mutex<Vec<ChatRequest>>,
    /// Pages requested from the summary list
    pub list_calls: Mutex<Vec<ListPage>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(VecDeque::new()),
            responses: Mutex::new(VecDeque::new()),
            lists: Mutex::new(VecDeque::new()),
            details: Mutex::new(VecDeque::new()),
            deletes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            list_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_stream(&self, events: Vec<StreamEvent>) {
        self.queue_stream_script(events.into_iter().map(Ok).collect());
    }

    pub fn queue_stream_script(&self, script: StreamScript) {
        self.streams.lock().unwrap().push_back(Ok(script));
    }

    pub fn queue_stream_open_error(&self, error: ChatError) {
        self.streams.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_response(&self, response: ChatResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_response_error(&self, error: ChatError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_list(&self, conversations: Vec<Conversation>) {
        self.lists.lock().unwrap().push_back(Ok(conversations));
    }

    pub fn queue_list_error(&self, error: ChatError) {
        self.lists.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_detail(&self, conversation: Conversation) {
        self.details.lock().unwrap().push_back(Ok(conversation));
    }

    pub fn queue_delete(&self, success: bool) {
        self.deletes.lock().unwrap().push_back(Ok(success));
    }

    pub fn queue_delete_error(&self, error: ChatError) {
        self.deletes.lock().unwrap().push_back(Err(error));
    }
}

fn encode_frame(event: &StreamEvent) -> Vec<u8> {
    let payload = serde_json::to_string(event).expect("stream event serializes");
    format!("data: {payload}\n\n").into_bytes()
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::transport("No scripted response queued")))
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::transport("No scripted stream queued")))?;

        let chunks: Vec<Result<Vec<u8>, ChatError>> = script
            .into_iter()
            .map(|item| item.map(|event| encode_frame(&event)))
            .collect();
        Ok(EventStream::from_bytes(
            futures::stream::iter(chunks).boxed(),
            Duration::from_secs(5),
        ))
    }

    async fn list_conversations(&self, page: ListPage) -> Result<Vec<Conversation>, ChatError> {
        self.list_calls.lock().unwrap().push(page);
        // Defaults to an empty list so settled sends don't all need a
        // scripted refresh.
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn conversation_detail(&self, _id: &str) -> Result<Conversation, ChatError> {
        self.details
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::directory("No scripted detail queued")))
    }

    async fn delete_conversation(&self, _id: &str) -> Result<bool, ChatError> {
        self.deletes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::directory("No scripted delete queued")))
    }
}
