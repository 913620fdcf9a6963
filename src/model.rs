//! Caller-visible conversation data model
//!
//! Messages appended optimistically carry a locally generated id with the
//! `local-` prefix until the server confirms them.

use crate::protocol::{ChatResponse, CodeModification, ReactStep, UsageInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved prefix for locally generated placeholder ids
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Optimistic user message, pending server confirmation
    pub fn local_user(content: impl Into<String>) -> Self {
        Self {
            id: format!("{LOCAL_ID_PREFIX}user-{}", uuid::Uuid::new_v4()),
            role: Role::User,
            content: content.into(),
            meta: None,
            created_at: Utc::now(),
        }
    }

    /// Empty ephemeral assistant message, filled in as the stream arrives
    pub fn local_assistant() -> Self {
        Self {
            id: format!("{LOCAL_ID_PREFIX}assistant-{}", uuid::Uuid::new_v4()),
            role: Role::Assistant,
            content: String::new(),
            meta: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this message still carries a locally generated placeholder id
    pub fn is_local(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }
}

/// Structured annotations on assistant messages. Entirely additive: every
/// field is optional and absence must not break consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_modifications: Vec<CodeModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasoning_trace: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub react_steps: Vec<ReactStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageInfo>,
}

impl MessageMeta {
    /// Derive annotations from a terminal `done` payload. Returns None when
    /// the payload carries nothing worth attaching.
    pub fn from_response(resp: &ChatResponse) -> Option<Self> {
        let mut meta = Self {
            code_modifications: resp.code_modifications.clone(),
            security_warnings: resp.suggestions.clone(),
            ..Self::default()
        };

        if let Some(state) = &resp.workflow_state {
            meta.workflow_phase = state.current_phase.clone();
            if let Some(outputs) = &state.phase_outputs {
                meta.reasoning_trace = outputs.reasoning_trace.clone();
                meta.react_steps = outputs.react_steps.clone();
                meta.usage = outputs.usage.clone();
            }
        }

        if meta == Self::default() {
            None
        } else {
            Some(meta)
        }
    }
}

/// A conversation. The summary list omits `messages`; the detail view
/// carries the full ordered sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ModificationType, PhaseOutputs, WorkflowState};

    #[test]
    fn local_ids_are_distinguishable() {
        let user = Message::local_user("hi");
        let assistant = Message::local_assistant();
        assert!(user.is_local());
        assert!(assistant.is_local());
        assert_ne!(user.id, assistant.id);

        let confirmed = Message {
            id: "msg-42".to_string(),
            ..assistant
        };
        assert!(!confirmed.is_local());
    }

    #[test]
    fn meta_from_bare_response_is_none() {
        let resp = ChatResponse {
            message_id: "m1".to_string(),
            content: "hi".to_string(),
            conversation_id: "c1".to_string(),
            workflow_state: None,
            code_modifications: vec![],
            suggestions: vec![],
        };
        assert!(MessageMeta::from_response(&resp).is_none());
    }

    #[test]
    fn meta_from_full_response() {
        let resp = ChatResponse {
            message_id: "m1".to_string(),
            content: "patched".to_string(),
            conversation_id: "c1".to_string(),
            workflow_state: Some(WorkflowState {
                current_phase: Some("implementation".to_string()),
                active_personas: vec!["coder".to_string()],
                phase_outputs: Some(PhaseOutputs {
                    reasoning_trace: vec!["step one".to_string()],
                    react_steps: vec![],
                    usage: None,
                }),
                security_flags: vec![],
            }),
            code_modifications: vec![CodeModification {
                file_path: "src/lib.rs".to_string(),
                modification_type: ModificationType::Modify,
                content: "fn main() {}".to_string(),
            }],
            suggestions: vec!["avoid unwrap".to_string()],
        };

        let meta = MessageMeta::from_response(&resp).unwrap();
        assert_eq!(meta.workflow_phase.as_deref(), Some("implementation"));
        assert_eq!(meta.code_modifications.len(), 1);
        assert_eq!(meta.security_warnings, vec!["avoid unwrap".to_string()]);
        assert_eq!(meta.reasoning_trace, vec!["step one".to_string()]);
    }
}
