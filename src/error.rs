//! Client error types

use thiserror::Error;

/// Chat client error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    /// HTTP status, when the failure came with one
    pub status: Option<u16>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Validation, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Timeout, message)
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Application, message)
    }

    pub fn directory(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Directory, message)
    }

    /// Rebrand a failure of a list/detail/delete call, keeping the
    /// message and status.
    pub fn into_directory(mut self) -> Self {
        self.kind = ChatErrorKind::Directory;
        self
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// Empty input or caller misuse - rejected before any network call
    Validation,
    /// Non-success status, connect/read failure
    Transport,
    /// No bytes and no terminal event within the idle window
    Timeout,
    /// Malformed frame surfaced as an error (current policy is silent
    /// discard, so nothing constructs this today)
    #[allow(dead_code)]
    Protocol,
    /// Explicit `error` event from the server
    Application,
    /// Failure of a conversation list/detail/delete call
    Directory,
}

impl ChatErrorKind {
    /// Terminates an in-flight send (as opposed to directory-only failures)
    pub fn is_terminal_for_send(&self) -> bool {
        matches!(self, Self::Transport | Self::Timeout | Self::Application)
    }
}
