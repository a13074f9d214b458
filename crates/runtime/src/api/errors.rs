//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, refused player actions and
//! player controllers so clients can bubble them up with consistent context.
use combat_core::PlayerActionError;
use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    PlayerAction(#[from] PlayerActionError),

    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("player controller failed: {0}")]
    Controller(String),
}

impl RuntimeError {
    /// Refused player actions leave the world untouched and can be retried.
    pub fn is_refused_action(&self) -> bool {
        matches!(self, RuntimeError::PlayerAction(_))
    }
}
