//! Observable session state and send-lifecycle phases

use crate::model::{Conversation, Message};

/// Lifecycle of one send interaction.
///
/// `Idle` is both the initial phase and the one conceptually re-entered
/// after `Settled`/`Failed` (the next `send` starts a fresh interaction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    #[default]
    Idle,
    /// Optimistic messages appended, request not yet streaming
    Sending,
    /// Stream open, events being applied
    Streaming,
    /// Terminal success of the interaction
    Settled,
    /// Terminal failure of the interaction
    Failed,
}

impl SendPhase {
    /// A new send must be rejected while one is in flight
    pub fn is_in_flight(self) -> bool {
        matches!(self, SendPhase::Sending | SendPhase::Streaming)
    }
}

/// State visible to the caller.
///
/// Owned exclusively by one [`ChatSession`](super::ChatSession) and mutated
/// only through its transitions; read access via `ChatSession::state`.
#[derive(Debug, Default)]
pub struct SessionState {
    pub current_conversation_id: Option<String>,
    /// Active conversation, ordered by append time; never reordered
    pub messages: Vec<Message>,
    /// Summary list; entries never embed message bodies
    pub conversations: Vec<Conversation>,
    pub is_loading: bool,
    pub is_history_loading: bool,
    pub error: Option<String>,
}
