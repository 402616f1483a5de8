//! Wire protocol: WebSocket events and HTTP match endpoint DTOs.
//!
//! Inbound and outbound WebSocket events are internally-tagged JSON
//! objects with camelCase names matching the reference client.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, Identity, RoomId};

// ============================================================================
// Client → Server events
// ============================================================================

/// Event sent from a connected client to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Request a partner for (topic, mode); enqueues or matches immediately.
    #[serde(rename_all = "camelCase")]
    JoinWaitingRoom {
        identity: String,
        topic: String,
        mode: String,
    },
    /// Join a known room directly and receive its history.
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String, identity: String },
    /// Relay a message to all members of a room.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        room_id: String,
        sender: String,
        text: String,
        identity: String,
    },
}

// ============================================================================
// Server → Client events
// ============================================================================

/// Event pushed from the server to a connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Delivered to both parties of a pairing, and to a direct joiner as
    /// the history replay.
    #[serde(rename_all = "camelCase")]
    Matched {
        room_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        partner_identity: Option<String>,
        history: Vec<ChatMessage>,
    },
    /// A single relayed message, fanned out to every room member.
    Message {
        #[serde(flatten)]
        message: ChatMessage,
    },
    /// Informational error; the connection stays open.
    Error { message: String },
}

impl ServerEvent {
    pub fn matched(room_id: &RoomId, partner: Option<&Identity>, history: Vec<ChatMessage>) -> Self {
        Self::Matched {
            room_id: room_id.as_str().to_string(),
            partner_identity: partner.map(|p| p.as_str().to_string()),
            history,
        }
    }

    pub fn message(message: ChatMessage) -> Self {
        Self::Message { message }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// ============================================================================
// HTTP match endpoint
// ============================================================================

/// Body of `POST /api/match`. Fields are optional so that a missing
/// field is reported as a 400 instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub identity: Option<String>,
    pub topic: Option<String>,
    pub mode: Option<String>,
}

/// Response of `POST /api/match`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_identity: Option<String>,
}

impl MatchResponse {
    pub fn waiting() -> Self {
        Self {
            matched: false,
            room_id: None,
            partner_identity: None,
        }
    }

    pub fn matched(room_id: &RoomId, partner: &Identity) -> Self {
        Self {
            matched: true,
            room_id: Some(room_id.as_str().to_string()),
            partner_identity: Some(partner.as_str().to_string()),
        }
    }
}

/// Summary of an active room for the observation endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub members: usize,
    pub messages: usize,
    pub created_at: String,
}
