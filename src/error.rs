//! Error types for the synchronization core.
//!
//! Nothing in the core is fatal: every error degrades to a partial no-op
//! plus a diagnostic, and is handed back to the caller of the operation.

use crate::modes::IntentId;
use crate::wire::Message;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors returned by protocol synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("{user} is not on {channel}")]
    NotMember { user: String, channel: String },

    #[error("unknown mode intent: {0}")]
    UnknownIntent(IntentId),

    #[error("mode intent {0} was already emitted")]
    IntentAlreadyEmitted(IntentId),

    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<Message>),
}

impl SyncError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUser(_) => "unknown_user",
            Self::UnknownChannel(_) => "unknown_channel",
            Self::NotMember { .. } => "not_member",
            Self::UnknownIntent(_) => "unknown_intent",
            Self::IntentAlreadyEmitted(_) => "intent_already_emitted",
            Self::Send(_) => "send_error",
        }
    }
}

/// Result type for synchronization operations.
pub type SyncResult<T = ()> = Result<T, SyncError>;

/// Errors produced while tokenizing a TS6 line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("empty line")]
    Empty,

    #[error("{command} needs at least {needed} parameters, got {got}")]
    NeedMoreParams {
        command: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
