//! Room registry: active rooms, their membership and message history.

use std::collections::HashMap;

use crate::domain::{ChatMessage, ConnectionId, RoomId};

/// Maximum number of simultaneous members in a room.
pub const ROOM_CAPACITY: usize = 2;

/// An active conversation room.
pub struct Room {
    pub id: RoomId,
    /// Member connections in join order.
    pub members: Vec<ConnectionId>,
    /// Message history in append order. Single append point per room,
    /// so this is a total order observed identically by all members.
    pub history: Vec<ChatMessage>,
    pub created_at: i64,
}

/// Result of adding a member to a room.
#[derive(Debug, PartialEq, Eq)]
pub enum AddMember {
    Added,
    AlreadyMember,
    Full,
}

/// Owner of all active rooms. Mutated only by the engine under its lock.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Register a new empty room.
    pub fn create(&mut self, room_id: RoomId, created_at: i64) {
        tracing::info!("Room '{}' created", room_id);
        self.rooms.insert(
            room_id.clone(),
            Room {
                id: room_id,
                members: Vec::new(),
                history: Vec::new(),
                created_at,
            },
        );
    }

    /// Create the room if it does not exist yet.
    ///
    /// Sends and joins that reference an unknown room get an empty room
    /// instead of an error, which keeps the relay resilient to clients
    /// whose room state has drifted (e.g. a roomId obtained from the
    /// polling endpoint before either party connected).
    pub fn ensure(&mut self, room_id: &RoomId, now: i64) {
        if !self.rooms.contains_key(room_id) {
            self.create(room_id.clone(), now);
        }
    }

    /// Add a connection as a room member, in join order.
    pub fn add_member(&mut self, room_id: &RoomId, conn: ConnectionId) -> AddMember {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return AddMember::Full;
        };
        if room.members.contains(&conn) {
            return AddMember::AlreadyMember;
        }
        if room.members.len() >= ROOM_CAPACITY {
            return AddMember::Full;
        }
        room.members.push(conn);
        AddMember::Added
    }

    /// Remove a member; the room is dropped once its membership reaches
    /// zero. History already replayed to participants is theirs to keep.
    pub fn remove_member(&mut self, room_id: &RoomId, conn: &ConnectionId) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        room.members.retain(|m| m != conn);
        if room.members.is_empty() {
            tracing::info!("Room '{}' is empty, dropping", room_id);
            self.rooms.remove(room_id);
        }
    }

    /// Append a message to a room's history. The registry is the single
    /// append point, so per-room ordering is total.
    pub fn append(&mut self, room_id: &RoomId, message: ChatMessage) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.history.push(message);
        } else {
            tracing::warn!("Dropping message for unknown room '{}'", room_id);
        }
    }

    pub fn history(&self, room_id: &RoomId) -> &[ChatMessage] {
        self.rooms
            .get(room_id)
            .map(|r| r.history.as_slice())
            .unwrap_or(&[])
    }

    pub fn members(&self, room_id: &RoomId) -> &[ConnectionId] {
        self.rooms
            .get(room_id)
            .map(|r| r.members.as_slice())
            .unwrap_or(&[])
    }

    /// All rooms the given connection is currently a member of.
    pub fn rooms_of(&self, conn: &ConnectionId) -> Vec<RoomId> {
        self.rooms
            .values()
            .filter(|r| r.members.contains(conn))
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }
}
