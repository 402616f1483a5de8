//! Engine errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// An operation referenced a connection that was never registered
    /// (or has already been torn down).
    #[error("unknown connection '{0}'")]
    UnknownConnection(String),

    /// A direct join targeted a room that already has both members.
    #[error("room '{0}' is full")]
    RoomFull(String),
}
