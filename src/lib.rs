//! emberchat - streaming chat client
//!
//! A client for a chat-completion backend that speaks both a single-shot
//! REST path and an incrementally-delivered event stream, reconciling the
//! two into one consistent, append-only conversation history:
//!
//! - [`protocol`] - wire types and the incremental frame decoder
//! - [`transport`] - the streaming request and its pull-based event sequence
//! - [`gateway`] - the REST surface and the [`gateway::ChatBackend`] seam
//! - [`session`] - the per-conversation state machine and directory
//! - [`model`] - the caller-visible data model

pub mod error;
pub mod gateway;
pub mod model;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::{ChatError, ChatErrorKind};
pub use gateway::{ChatBackend, GatewayConfig, HttpGateway, ListPage};
pub use model::{Conversation, Message, MessageMeta, Role};
pub use session::{ChatSession, SendPhase, SessionState};
