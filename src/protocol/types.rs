//! Wire types for the chat backend

use serde::{Deserialize, Serialize};

/// Request body for both the buffered and streaming send paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id,
        }
    }
}

/// Terminal payload of a send: the server-confirmed assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message_id: String,
    pub content: String,
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<WorkflowState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_modifications: Vec<CodeModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Server-side workflow snapshot attached to a terminal payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_personas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_outputs: Option<PhaseOutputs>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_flags: Vec<String>,
}

/// Typed subset of the workflow's per-phase outputs; unknown keys are
/// ignored on decode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutputs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasoning_trace: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub react_steps: Vec<ReactStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageInfo>,
}

/// One step of a tool-using reasoning loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactStep {
    pub step: u32,
    pub action: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
}

/// Token accounting reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A suggested source change attached to an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeModification {
    pub file_path: String,
    pub modification_type: ModificationType,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModificationType {
    Add,
    Modify,
    Delete,
}

/// Response body of the delete endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// One decoded event from the streaming channel.
///
/// Only these five variants are recognized; frames with any other `type`
/// are dropped by the decoder for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Chunk {
        #[serde(default)]
        content: String,
    },
    Status {
        #[serde(default)]
        content: String,
    },
    Error {
        #[serde(default = "default_error_message")]
        message: String,
    },
    Done {
        payload: ChatResponse,
    },
    Ping,
}

fn default_error_message() -> String {
    "Stream error".to_string()
}

impl StreamEvent {
    /// Whether this event ends the stream from the session's perspective
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }
}
