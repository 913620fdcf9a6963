//! Chat session state machine and conversation directory
//!
//! One [`ChatSession`] owns the state for one conversation view. A send
//! appends an optimistic user message plus an empty ephemeral assistant
//! message, applies stream events to the ephemeral as they arrive, and on
//! the terminal `done` event replaces it in place with the server-confirmed
//! message. The caller only ever observes consistent, append-only history.

mod state;
#[cfg(test)]
mod testing;

pub use state::{SendPhase, SessionState};

use crate::error::ChatError;
use crate::gateway::{ChatBackend, ListPage};
use crate::model::{Message, MessageMeta};
use crate::protocol::{ChatRequest, ChatResponse, StreamEvent};
use std::sync::Arc;

/// Per-conversation session: state machine plus directory operations.
///
/// Owned by the caller's runtime context; independent sessions are fully
/// isolated from each other.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    state: SessionState,
    phase: SendPhase,
    /// Id of the current ephemeral assistant message, if one exists.
    /// At most one exists at any time.
    ephemeral_id: Option<String>,
    /// The ephemeral's content is a transient status line, to be cleared
    /// by the first real chunk
    ephemeral_is_status: bool,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            state: SessionState::default(),
            phase: SendPhase::Idle,
            ephemeral_id: None,
            ephemeral_is_status: false,
        }
    }

    /// Observable state for rendering
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current lifecycle phase of the last/ongoing send
    pub fn phase(&self) -> SendPhase {
        self.phase
    }

    // ==================== Send Paths ====================

    /// Streaming send. Appends the optimistic messages, consumes stream
    /// events until a terminal one, and refreshes the conversation list
    /// after settling.
    pub async fn send(&mut self, text: &str) -> Result<(), ChatError> {
        self.begin_send(text)?;

        let request = ChatRequest::new(text, self.state.current_conversation_id.clone());
        let mut stream = match self.backend.open_stream(&request).await {
            Ok(stream) => stream,
            Err(err) => return Err(self.fail_send(err)),
        };
        self.phase = SendPhase::Streaming;

        while let Some(item) = stream.next_event().await {
            match item {
                Ok(event) => {
                    if let Some(err) = self.apply_event(event) {
                        return Err(err);
                    }
                    if self.phase == SendPhase::Settled {
                        break;
                    }
                }
                Err(err) => return Err(self.fail_send(err)),
            }
        }

        if self.phase != SendPhase::Settled {
            // Body ended without a terminal event: nothing confirmed the
            // optimistic assistant message, so it must not survive.
            return Err(self.fail_send(ChatError::transport("Stream closed before completion")));
        }

        self.refresh_after_settle().await;
        Ok(())
    }

    /// Non-streaming send: one round trip whose response is the final
    /// message. Same optimistic append; no `Streaming` phase.
    pub async fn send_buffered(&mut self, text: &str) -> Result<(), ChatError> {
        self.begin_send(text)?;

        let request = ChatRequest::new(text, self.state.current_conversation_id.clone());
        match self.backend.send_message(&request).await {
            Ok(response) => {
                self.settle(response);
                self.refresh_after_settle().await;
                Ok(())
            }
            Err(err) => Err(self.fail_send(err)),
        }
    }

    /// Reset to an empty unsaved conversation. No-op while a send is in
    /// flight (a benign guard, not an error).
    pub fn start_new_conversation(&mut self) {
        if self.phase.is_in_flight() {
            return;
        }
        self.state.current_conversation_id = None;
        self.state.messages.clear();
        self.state.error = None;
        self.ephemeral_id = None;
        self.ephemeral_is_status = false;
        self.phase = SendPhase::Idle;
    }

    // ==================== Conversation Directory ====================

    /// Fetch the summary list and replace `conversations` wholesale; the
    /// remote is authoritative for its order and content. On failure the
    /// previous list is left untouched and `error` is set.
    pub async fn load_conversations(&mut self) -> Result<(), ChatError> {
        self.state.is_history_loading = true;
        self.state.error = None;

        let result = self.backend.list_conversations(ListPage::default()).await;
        self.state.is_history_loading = false;

        match result {
            Ok(mut conversations) => {
                // Summaries never carry message bodies.
                for conversation in &mut conversations {
                    conversation.messages = None;
                }
                self.state.conversations = conversations;
                Ok(())
            }
            Err(err) => {
                self.state.error = Some(err.message.clone());
                Err(err)
            }
        }
    }

    /// Fetch full detail and replace the active conversation wholesale,
    /// discarding any unsent local session state.
    pub async fn load_conversation_detail(&mut self, id: &str) -> Result<(), ChatError> {
        self.state.is_history_loading = true;
        self.state.error = None;

        let result = self.backend.conversation_detail(id).await;
        self.state.is_history_loading = false;

        match result {
            Ok(detail) => {
                self.state.current_conversation_id = Some(detail.id);
                self.state.messages = detail.messages.unwrap_or_default();
                self.ephemeral_id = None;
                self.ephemeral_is_status = false;
                Ok(())
            }
            Err(err) => {
                self.state.error = Some(err.message.clone());
                Err(err)
            }
        }
    }

    /// Delete a conversation and drop it from the summary list; if it was
    /// the active one, clear the active view too. Failure leaves all state
    /// unchanged except `error`.
    pub async fn delete_conversation(&mut self, id: &str) -> Result<(), ChatError> {
        self.state.error = None;

        match self.backend.delete_conversation(id).await {
            Ok(true) => {
                self.state.conversations.retain(|c| c.id != id);
                if self.state.current_conversation_id.as_deref() == Some(id) {
                    self.state.current_conversation_id = None;
                    self.state.messages.clear();
                }
                Ok(())
            }
            Ok(false) => {
                let err =
                    ChatError::directory(format!("Server refused to delete conversation {id}"));
                self.state.error = Some(err.message.clone());
                Err(err)
            }
            Err(err) => {
                self.state.error = Some(err.message.clone());
                Err(err)
            }
        }
    }

    // ==================== Transitions ====================

    /// Validate, then perform the atomic optimistic append.
    fn begin_send(&mut self, text: &str) -> Result<(), ChatError> {
        if text.is_empty() {
            return Err(ChatError::validation("Message text is empty"));
        }
        if self.phase.is_in_flight() {
            return Err(ChatError::validation(
                "A send is already in flight for this session",
            ));
        }

        self.state.error = None;
        self.state.is_loading = true;
        self.phase = SendPhase::Sending;

        self.state.messages.push(Message::local_user(text));
        let assistant = Message::local_assistant();
        self.ephemeral_id = Some(assistant.id.clone());
        self.ephemeral_is_status = false;
        self.state.messages.push(assistant);
        Ok(())
    }

    /// Apply one stream event. Returns the terminal error when the event
    /// was a server-side `error`.
    fn apply_event(&mut self, event: StreamEvent) -> Option<ChatError> {
        match event {
            StreamEvent::Chunk { content } => {
                let clear_status = std::mem::take(&mut self.ephemeral_is_status);
                if let Some(index) = self.ephemeral_index() {
                    let msg = &mut self.state.messages[index];
                    if clear_status {
                        msg.content.clear();
                    }
                    msg.content.push_str(&content);
                }
                None
            }
            StreamEvent::Status { content } => {
                if let Some(index) = self.ephemeral_index() {
                    let msg = &mut self.state.messages[index];
                    if msg.content.is_empty() {
                        msg.content = content;
                        self.ephemeral_is_status = true;
                    }
                }
                None
            }
            StreamEvent::Error { message } => {
                self.remove_ephemeral();
                self.state.error = Some(message.clone());
                self.state.is_loading = false;
                self.phase = SendPhase::Failed;
                tracing::warn!(error = %message, "Server reported stream error");
                Some(ChatError::application(message))
            }
            StreamEvent::Done { payload } => {
                self.settle(payload);
                None
            }
            StreamEvent::Ping => None,
        }
    }

    /// Replace the ephemeral message in place with its server-confirmed
    /// counterpart. The only transition allowed to change a message id.
    fn settle(&mut self, payload: ChatResponse) {
        let meta = MessageMeta::from_response(&payload);
        let ChatResponse {
            message_id,
            content,
            conversation_id,
            ..
        } = payload;

        if let Some(index) = self.ephemeral_index() {
            let msg = &mut self.state.messages[index];
            msg.id = message_id.clone();
            msg.content = content;
            msg.meta = meta;
        }
        self.ephemeral_id = None;
        self.ephemeral_is_status = false;

        self.state.current_conversation_id = Some(conversation_id.clone());
        self.state.is_loading = false;
        self.phase = SendPhase::Settled;
        tracing::info!(%message_id, %conversation_id, "Send settled");
    }

    /// Transport-level failure before any server confirmation: the
    /// ephemeral message must not linger as an empty bubble.
    fn fail_send(&mut self, err: ChatError) -> ChatError {
        self.remove_ephemeral();
        self.state.error = Some(err.message.clone());
        self.state.is_loading = false;
        self.phase = SendPhase::Failed;
        tracing::warn!(error = %err, "Send failed");
        err
    }

    /// Fire-and-forget relative to the send itself: a refresh failure is
    /// reported through `error` but never reverts the settled send.
    async fn refresh_after_settle(&mut self) {
        if let Err(err) = self.load_conversations().await {
            tracing::warn!(error = %err, "Conversation list refresh after send failed");
        }
    }

    fn ephemeral_index(&self) -> Option<usize> {
        let id = self.ephemeral_id.as_deref()?;
        self.state.messages.iter().position(|m| m.id == id)
    }

    fn remove_ephemeral(&mut self) {
        if let Some(index) = self.ephemeral_index() {
            self.state.messages.remove(index);
        }
        self.ephemeral_id = None;
        self.ephemeral_is_status = false;
    }
}
