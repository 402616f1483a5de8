//! Chat messages and room history entries.

use serde::{Deserialize, Serialize};

/// Display name used for server-generated messages.
pub const SYSTEM_SENDER: &str = "System";

/// Identity token used for server-generated messages.
pub const SYSTEM_SENDER_ID: &str = "system";

/// A single relayed message. Immutable once created; appended to exactly
/// one room's history in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Display name of the sender.
    pub sender: String,
    /// Identity token of the sender ("system" for server messages).
    pub sender_id: String,
    /// Message body.
    pub text: String,
    /// Unix timestamp in milliseconds when the server accepted the message.
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(sender: String, sender_id: String, text: String, timestamp: i64) -> Self {
        Self {
            sender,
            sender_id,
            text,
            timestamp,
        }
    }

    /// Build a server-generated system message.
    pub fn system(text: String, timestamp: i64) -> Self {
        Self {
            sender: SYSTEM_SENDER.to_string(),
            sender_id: SYSTEM_SENDER_ID.to_string(),
            text,
            timestamp,
        }
    }

    pub fn is_system(&self) -> bool {
        self.sender_id == SYSTEM_SENDER_ID
    }
}
