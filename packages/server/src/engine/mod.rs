//! The single-writer match and relay engine.
//!
//! One `Engine` owns every piece of shared mutable state: the connected
//! client registry, the waiting pool, the room registry, and the
//! pending-match records for the polling endpoint. The UI layer wraps it
//! in a single `tokio::sync::Mutex`, so no two mutations can interleave
//! and per-room history ordering is total, the same serialization
//! guarantee a single-threaded event loop would give.
//!
//! Outbound events are pushed down per-connection unbounded channels,
//! which never block, so no engine operation waits on another
//! connection's progress.

mod error;
mod pool;
mod registry;

pub use error::EngineError;
pub use pool::{WaitingEntry, WaitingPool};
pub use registry::{AddMember, Room, RoomRegistry, ROOM_CAPACITY};

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::domain::{ChatMessage, ConnectionId, Identity, Mode, RoomId, Topic};
use crate::protocol::ServerEvent;

/// Channel used to push serialized events to a connection.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// A connected WebSocket client.
pub struct ClientInfo {
    /// Event sender channel for this connection.
    pub sender: PusherChannel,
    /// Display identity, learned from the first event that carries one.
    pub identity: Option<Identity>,
    /// Unix timestamp in milliseconds when the connection was registered.
    pub connected_at: i64,
}

/// A completed pairing, kept so repeated polls from either party return
/// the same room instead of re-matching. Never mutated; retained for the
/// process lifetime.
#[derive(Debug, Clone)]
pub struct PendingMatch {
    pub room_id: RoomId,
    pub partner: Identity,
}

/// Result of submitting a participant to the matcher.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// Paired immediately with a waiting counterpart.
    Matched { room_id: RoomId, partner: Identity },
    /// Enqueued; a later submission may complete the match.
    Waiting,
}

#[derive(Default)]
pub struct Engine {
    clients: HashMap<ConnectionId, ClientInfo>,
    pool: WaitingPool,
    rooms: RoomRegistry,
    pending: HashMap<Identity, PendingMatch>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly upgraded connection.
    pub fn register_conn(&mut self, conn: ConnectionId, sender: PusherChannel, now: i64) {
        tracing::debug!("Connection '{}' registered", conn);
        self.clients.insert(
            conn,
            ClientInfo {
                sender,
                identity: None,
                connected_at: now,
            },
        );
    }

    pub fn connected_count(&self) -> usize {
        self.clients.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.pool.len()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    /// Submit a connected participant to the matcher (`joinWaitingRoom`).
    ///
    /// On a match both parties receive a `matched` event carrying the
    /// room id, the counterpart's identity, and the full history. On no
    /// match (including the counterpart-died race) the participant is
    /// enqueued, superseding any prior entry with the same identity.
    pub fn join_waiting(
        &mut self,
        conn: &ConnectionId,
        identity: Identity,
        topic: Topic,
        mode: Mode,
        now: i64,
    ) -> Result<MatchOutcome, EngineError> {
        let info = self
            .clients
            .get_mut(conn)
            .ok_or_else(|| EngineError::UnknownConnection(conn.to_string()))?;
        info.identity = Some(identity.clone());
        let sender = info.sender.clone();

        // A re-request supersedes any prior slot, even when the new
        // request matches immediately.
        self.pool.remove_identity(&identity);

        match self.pool.take_match(&topic, mode, &identity) {
            Some(counterpart) => {
                let room_id = self.open_room(&counterpart.identity, &identity, now);
                // The counterpart joined first, so it is the older member.
                if let Some(cp_conn) = counterpart.conn.clone() {
                    self.rooms.add_member(&room_id, cp_conn);
                }
                self.rooms.add_member(&room_id, conn.clone());

                let history = self.rooms.history(&room_id).to_vec();
                self.push_to_conn(
                    conn,
                    &ServerEvent::matched(&room_id, Some(&counterpart.identity), history.clone()),
                );
                if let Some(cp_conn) = &counterpart.conn {
                    self.push_to_conn(
                        cp_conn,
                        &ServerEvent::matched(&room_id, Some(&identity), history),
                    );
                }

                tracing::info!(
                    "Matched '{}' with '{}' in room '{}' (topic '{}', mode '{}')",
                    identity,
                    counterpart.identity,
                    room_id,
                    topic,
                    mode
                );
                Ok(MatchOutcome::Matched {
                    room_id,
                    partner: counterpart.identity,
                })
            }
            None => {
                self.pool.enqueue(WaitingEntry {
                    conn: Some(conn.clone()),
                    sender: Some(sender),
                    identity: identity.clone(),
                    topic: topic.clone(),
                    mode,
                    joined_at: now,
                });
                tracing::info!(
                    "'{}' is waiting (topic '{}', mode '{}', {} in pool)",
                    identity,
                    topic,
                    mode,
                    self.pool.len()
                );
                Ok(MatchOutcome::Waiting)
            }
        }
    }

    /// Stateless-request matching (`POST /api/match`).
    ///
    /// Idempotent for already-matched identities: the pending-match
    /// record is consulted before the pool, so every repeated poll
    /// returns the same room id.
    pub fn poll_match(
        &mut self,
        identity: Identity,
        topic: Topic,
        mode: Mode,
        now: i64,
    ) -> MatchOutcome {
        if let Some(pending) = self.pending.get(&identity) {
            return MatchOutcome::Matched {
                room_id: pending.room_id.clone(),
                partner: pending.partner.clone(),
            };
        }

        self.pool.remove_identity(&identity);

        match self.pool.take_match(&topic, mode, &identity) {
            Some(counterpart) => {
                let room_id = self.open_room(&counterpart.identity, &identity, now);
                // A connected counterpart becomes a member right away and
                // is told to stop waiting; the poller has no connection
                // yet and will join the room over its own socket.
                if let Some(cp_conn) = counterpart.conn.clone() {
                    self.rooms.add_member(&room_id, cp_conn.clone());
                    let history = self.rooms.history(&room_id).to_vec();
                    self.push_to_conn(
                        &cp_conn,
                        &ServerEvent::matched(&room_id, Some(&identity), history),
                    );
                }

                tracing::info!(
                    "Matched '{}' with '{}' in room '{}' via polling",
                    identity,
                    counterpart.identity,
                    room_id
                );
                MatchOutcome::Matched {
                    room_id,
                    partner: counterpart.identity,
                }
            }
            None => {
                self.pool.enqueue(WaitingEntry {
                    conn: None,
                    sender: None,
                    identity: identity.clone(),
                    topic,
                    mode,
                    joined_at: now,
                });
                MatchOutcome::Waiting
            }
        }
    }

    /// Direct room join for a caller that already knows a room id.
    ///
    /// Replays the existing history to the joiner only, then announces
    /// the join to the rest of the room.
    pub fn join_room(
        &mut self,
        conn: &ConnectionId,
        room_id: RoomId,
        identity: Identity,
        now: i64,
    ) -> Result<(), EngineError> {
        let info = self
            .clients
            .get_mut(conn)
            .ok_or_else(|| EngineError::UnknownConnection(conn.to_string()))?;
        info.identity = Some(identity.clone());

        // Unknown-room policy: create an empty room instead of failing.
        self.rooms.ensure(&room_id, now);
        let added = match self.rooms.add_member(&room_id, conn.clone()) {
            AddMember::Full => return Err(EngineError::RoomFull(room_id.to_string())),
            AddMember::Added => true,
            AddMember::AlreadyMember => false,
        };

        let partner = self
            .rooms
            .members(&room_id)
            .iter()
            .filter(|m| *m != conn)
            .find_map(|m| self.clients.get(m).and_then(|i| i.identity.clone()));
        let history = self.rooms.history(&room_id).to_vec();
        self.push_to_conn(
            conn,
            &ServerEvent::matched(&room_id, partner.as_ref(), history),
        );

        if added {
            let joined = ChatMessage::system(format!("{identity} joined the room"), now);
            self.rooms.append(&room_id, joined.clone());
            self.fan_out(&room_id, &ServerEvent::message(joined), Some(conn));
            tracing::info!("'{}' joined room '{}'", identity, room_id);
        }
        Ok(())
    }

    /// Append a message to a room's history and fan it out to all
    /// current members, the sender included, so every client renders
    /// from the same authoritative stream.
    pub fn send_message(
        &mut self,
        room_id: RoomId,
        sender: String,
        sender_id: String,
        text: String,
        now: i64,
    ) {
        self.rooms.ensure(&room_id, now);
        let message = ChatMessage::new(sender, sender_id, text, now);
        self.rooms.append(&room_id, message.clone());
        self.fan_out(&room_id, &ServerEvent::message(message), None);
    }

    /// Tear down a closed connection: drop its waiting entry, announce
    /// its departure once per room it was a member of, and release its
    /// room memberships.
    pub fn disconnect(&mut self, conn: &ConnectionId, now: i64) {
        if self.pool.remove_conn(conn) {
            tracing::debug!("Removed waiting entry for connection '{}'", conn);
        }

        let display = self
            .clients
            .get(conn)
            .and_then(|i| i.identity.as_ref())
            .map(|i| i.to_string())
            .unwrap_or_else(|| "Your partner".to_string());

        for room_id in self.rooms.rooms_of(conn) {
            let left = ChatMessage::system(format!("{display} left the room"), now);
            self.rooms.append(&room_id, left.clone());
            self.fan_out(&room_id, &ServerEvent::message(left), Some(conn));
            self.rooms.remove_member(&room_id, conn);
        }

        self.clients.remove(conn);
        tracing::info!("Connection '{}' disconnected and cleaned up", conn);
    }

    /// Create a room for a fresh pairing: empty history plus one system
    /// message, and pending-match records for both identities.
    fn open_room(&mut self, first: &Identity, second: &Identity, now: i64) -> RoomId {
        let room_id = RoomId::generate();
        self.rooms.create(room_id.clone(), now);
        self.rooms.append(
            &room_id,
            ChatMessage::system(format!("{first} and {second} are now connected"), now),
        );
        self.pending.insert(
            first.clone(),
            PendingMatch {
                room_id: room_id.clone(),
                partner: second.clone(),
            },
        );
        self.pending.insert(
            second.clone(),
            PendingMatch {
                room_id: room_id.clone(),
                partner: first.clone(),
            },
        );
        room_id
    }

    fn fan_out(&self, room_id: &RoomId, event: &ServerEvent, exclude: Option<&ConnectionId>) {
        for member in self.rooms.members(room_id) {
            if exclude == Some(member) {
                continue;
            }
            self.push_to_conn(member, event);
        }
    }

    fn push_to_conn(&self, conn: &ConnectionId, event: &ServerEvent) {
        let Some(info) = self.clients.get(conn) else {
            tracing::warn!("Cannot push event to unknown connection '{}'", conn);
            return;
        };
        let json = serde_json::to_string(event).expect("ServerEvent serialization cannot fail");
        if info.sender.send(json).is_err() {
            tracing::warn!("Failed to push event to connection '{}'", conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn identity(s: &str) -> Identity {
        Identity::try_from(s.to_string()).unwrap()
    }

    fn topic(s: &str) -> Topic {
        Topic::try_from(s.to_string()).unwrap()
    }

    fn connect(engine: &mut Engine, now: i64) -> (ConnectionId, UnboundedReceiver<String>) {
        let conn = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        engine.register_conn(conn.clone(), tx, now);
        (conn, rx)
    }

    fn recv_event(rx: &mut UnboundedReceiver<String>) -> Value {
        let raw = rx.try_recv().expect("expected a pushed event");
        serde_json::from_str(&raw).unwrap()
    }

    fn assert_no_event(rx: &mut UnboundedReceiver<String>) {
        assert!(rx.try_recv().is_err(), "expected no pushed event");
    }

    #[test]
    fn test_first_participant_waits() {
        let mut engine = Engine::new();
        let (conn, mut rx) = connect(&mut engine, 0);

        let outcome = engine
            .join_waiting(&conn, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();

        assert!(matches!(outcome, MatchOutcome::Waiting));
        assert_eq!(engine.waiting_count(), 1);
        assert_no_event(&mut rx);
    }

    #[test]
    fn test_second_compatible_participant_matches_and_both_are_notified() {
        let mut engine = Engine::new();
        let (conn_a, mut rx_a) = connect(&mut engine, 0);
        let (conn_b, mut rx_b) = connect(&mut engine, 0);

        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();
        let outcome = engine
            .join_waiting(&conn_b, identity("bob"), topic("grief"), Mode::Text, 2)
            .unwrap();

        let MatchOutcome::Matched { room_id, partner } = outcome else {
            panic!("expected a match");
        };
        assert_eq!(partner, identity("alice"));
        assert_eq!(engine.waiting_count(), 0);

        let event_b = recv_event(&mut rx_b);
        assert_eq!(event_b["type"], "matched");
        assert_eq!(event_b["roomId"], room_id.as_str());
        assert_eq!(event_b["partnerIdentity"], "alice");

        let event_a = recv_event(&mut rx_a);
        assert_eq!(event_a["type"], "matched");
        assert_eq!(event_a["roomId"], room_id.as_str());
        assert_eq!(event_a["partnerIdentity"], "bob");
        // History already contains the system greeting.
        assert_eq!(event_a["history"][0]["senderId"], "system");
    }

    #[test]
    fn test_mode_mismatch_keeps_both_waiting() {
        let mut engine = Engine::new();
        let (conn_a, _rx_a) = connect(&mut engine, 0);
        let (conn_b, _rx_b) = connect(&mut engine, 0);

        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Video, 1)
            .unwrap();
        let outcome = engine
            .join_waiting(&conn_b, identity("bob"), topic("grief"), Mode::Text, 2)
            .unwrap();

        assert!(matches!(outcome, MatchOutcome::Waiting));
        assert_eq!(engine.waiting_count(), 2);
    }

    #[test]
    fn test_identity_never_matches_itself() {
        let mut engine = Engine::new();
        let (conn_a, _rx_a) = connect(&mut engine, 0);
        let (conn_b, _rx_b) = connect(&mut engine, 0);

        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();
        // Same identity from a second connection supersedes, never matches.
        let outcome = engine
            .join_waiting(&conn_b, identity("alice"), topic("grief"), Mode::Text, 2)
            .unwrap();

        assert!(matches!(outcome, MatchOutcome::Waiting));
        assert_eq!(engine.waiting_count(), 1);
    }

    #[test]
    fn test_rerequest_supersedes_prior_entry() {
        let mut engine = Engine::new();
        let (conn_a, _rx_a) = connect(&mut engine, 0);
        let (conn_b, _rx_b) = connect(&mut engine, 0);

        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();
        engine
            .join_waiting(&conn_a, identity("alice"), topic("anxiety"), Mode::Text, 2)
            .unwrap();

        // The old (grief, text) slot must be gone.
        let outcome = engine
            .join_waiting(&conn_b, identity("bob"), topic("grief"), Mode::Text, 3)
            .unwrap();
        assert!(matches!(outcome, MatchOutcome::Waiting));
        assert_eq!(engine.waiting_count(), 2);
    }

    #[test]
    fn test_dead_counterpart_is_skipped_and_initiator_enqueued() {
        let mut engine = Engine::new();
        let (conn_a, rx_a) = connect(&mut engine, 0);
        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();
        // alice's connection dies without a disconnect event reaching the
        // engine yet.
        drop(rx_a);

        let (conn_b, mut rx_b) = connect(&mut engine, 0);
        let outcome = engine
            .join_waiting(&conn_b, identity("bob"), topic("grief"), Mode::Text, 2)
            .unwrap();

        assert!(matches!(outcome, MatchOutcome::Waiting));
        assert_eq!(engine.waiting_count(), 1);
        assert_no_event(&mut rx_b);
    }

    #[test]
    fn test_send_message_fans_out_to_all_members_in_order() {
        let mut engine = Engine::new();
        let (conn_a, mut rx_a) = connect(&mut engine, 0);
        let (conn_b, mut rx_b) = connect(&mut engine, 0);
        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();
        let MatchOutcome::Matched { room_id, .. } = engine
            .join_waiting(&conn_b, identity("bob"), topic("grief"), Mode::Text, 2)
            .unwrap()
        else {
            panic!("expected a match");
        };
        // Drain the matched events.
        recv_event(&mut rx_a);
        recv_event(&mut rx_b);

        engine.send_message(
            room_id.clone(),
            "bob".to_string(),
            "bob".to_string(),
            "hi".to_string(),
            3,
        );
        engine.send_message(
            room_id.clone(),
            "alice".to_string(),
            "alice".to_string(),
            "hello".to_string(),
            4,
        );

        for rx in [&mut rx_a, &mut rx_b] {
            let first = recv_event(rx);
            assert_eq!(first["type"], "message");
            assert_eq!(first["sender"], "bob");
            assert_eq!(first["text"], "hi");
            let second = recv_event(rx);
            assert_eq!(second["sender"], "alice");
            assert_eq!(second["text"], "hello");
        }
    }

    #[test]
    fn test_send_to_unknown_room_creates_history_bucket() {
        let mut engine = Engine::new();
        let room_id = RoomId::try_from("drifted".to_string()).unwrap();

        engine.send_message(
            room_id.clone(),
            "alice".to_string(),
            "alice".to_string(),
            "anyone here?".to_string(),
            1,
        );

        let room = engine.rooms().find(|r| r.id == room_id).unwrap();
        assert_eq!(room.history.len(), 1);
        assert!(room.members.is_empty());
    }

    #[test]
    fn test_join_room_replays_history_to_joiner_only() {
        let mut engine = Engine::new();
        let room_id = RoomId::try_from("r1".to_string()).unwrap();
        engine.send_message(
            room_id.clone(),
            "alice".to_string(),
            "alice".to_string(),
            "first".to_string(),
            1,
        );

        let (conn_a, mut rx_a) = connect(&mut engine, 0);
        engine
            .join_room(&conn_a, room_id.clone(), identity("alice"), 2)
            .unwrap();

        let replay = recv_event(&mut rx_a);
        assert_eq!(replay["type"], "matched");
        assert_eq!(replay["roomId"], "r1");
        assert_eq!(replay["history"][0]["text"], "first");
        // No partner in the room yet.
        assert!(replay.get("partnerIdentity").is_none());
        // The joiner does not receive its own join announcement.
        assert_no_event(&mut rx_a);
    }

    #[test]
    fn test_join_room_announces_join_to_existing_members() {
        let mut engine = Engine::new();
        let room_id = RoomId::try_from("r1".to_string()).unwrap();
        let (conn_a, mut rx_a) = connect(&mut engine, 0);
        let (conn_b, mut rx_b) = connect(&mut engine, 0);
        engine
            .join_room(&conn_a, room_id.clone(), identity("alice"), 1)
            .unwrap();
        recv_event(&mut rx_a); // alice's replay

        engine
            .join_room(&conn_b, room_id.clone(), identity("bob"), 2)
            .unwrap();

        let replay = recv_event(&mut rx_b);
        assert_eq!(replay["partnerIdentity"], "alice");

        let announce = recv_event(&mut rx_a);
        assert_eq!(announce["type"], "message");
        assert_eq!(announce["senderId"], "system");
        assert_eq!(announce["text"], "bob joined the room");
    }

    #[test]
    fn test_join_room_rejects_third_member() {
        let mut engine = Engine::new();
        let room_id = RoomId::try_from("r1".to_string()).unwrap();
        let (conn_a, _rx_a) = connect(&mut engine, 0);
        let (conn_b, _rx_b) = connect(&mut engine, 0);
        let (conn_c, _rx_c) = connect(&mut engine, 0);
        engine
            .join_room(&conn_a, room_id.clone(), identity("alice"), 1)
            .unwrap();
        engine
            .join_room(&conn_b, room_id.clone(), identity("bob"), 2)
            .unwrap();

        let result = engine.join_room(&conn_c, room_id.clone(), identity("carol"), 3);

        assert_eq!(result, Err(EngineError::RoomFull("r1".to_string())));
    }

    #[test]
    fn test_disconnect_notifies_remaining_member_exactly_once() {
        let mut engine = Engine::new();
        let (conn_a, mut rx_a) = connect(&mut engine, 0);
        let (conn_b, mut rx_b) = connect(&mut engine, 0);
        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();
        engine
            .join_waiting(&conn_b, identity("bob"), topic("grief"), Mode::Text, 2)
            .unwrap();
        recv_event(&mut rx_a);
        recv_event(&mut rx_b);

        engine.disconnect(&conn_b, 3);

        let departure = recv_event(&mut rx_a);
        assert_eq!(departure["type"], "message");
        assert_eq!(departure["senderId"], "system");
        assert_eq!(departure["text"], "bob left the room");
        assert_no_event(&mut rx_a);
        assert_eq!(engine.connected_count(), 1);
    }

    #[test]
    fn test_room_is_dropped_after_both_members_disconnect() {
        let mut engine = Engine::new();
        let (conn_a, _rx_a) = connect(&mut engine, 0);
        let (conn_b, _rx_b) = connect(&mut engine, 0);
        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();
        engine
            .join_waiting(&conn_b, identity("bob"), topic("grief"), Mode::Text, 2)
            .unwrap();

        engine.disconnect(&conn_a, 3);
        engine.disconnect(&conn_b, 4);

        assert_eq!(engine.rooms().count(), 0);
        assert_eq!(engine.connected_count(), 0);
    }

    #[test]
    fn test_disconnect_while_waiting_removes_pool_entry() {
        let mut engine = Engine::new();
        let (conn_a, _rx_a) = connect(&mut engine, 0);
        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();

        engine.disconnect(&conn_a, 2);

        assert_eq!(engine.waiting_count(), 0);
    }

    #[test]
    fn test_poll_match_enqueues_then_matches() {
        let mut engine = Engine::new();

        let first = engine.poll_match(identity("alice"), topic("grief"), Mode::Text, 1);
        assert!(matches!(first, MatchOutcome::Waiting));

        let second = engine.poll_match(identity("bob"), topic("grief"), Mode::Text, 2);
        let MatchOutcome::Matched { room_id, partner } = second else {
            panic!("expected a match");
        };
        assert_eq!(partner, identity("alice"));

        // Repeated polls from either party return the same room.
        for id in ["alice", "bob"] {
            for _ in 0..3 {
                let repoll = engine.poll_match(identity(id), topic("grief"), Mode::Text, 3);
                let MatchOutcome::Matched {
                    room_id: repoll_room,
                    ..
                } = repoll
                else {
                    panic!("expected idempotent match for '{id}'");
                };
                assert_eq!(repoll_room, room_id);
            }
        }
    }

    #[test]
    fn test_poll_match_notifies_connected_counterpart() {
        let mut engine = Engine::new();
        let (conn_a, mut rx_a) = connect(&mut engine, 0);
        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();

        let outcome = engine.poll_match(identity("bob"), topic("grief"), Mode::Text, 2);

        let MatchOutcome::Matched { room_id, partner } = outcome else {
            panic!("expected a match");
        };
        assert_eq!(partner, identity("alice"));

        let event = recv_event(&mut rx_a);
        assert_eq!(event["type"], "matched");
        assert_eq!(event["roomId"], room_id.as_str());
        assert_eq!(event["partnerIdentity"], "bob");
    }

    #[test]
    fn test_ws_match_is_visible_to_polling() {
        let mut engine = Engine::new();
        let (conn_a, _rx_a) = connect(&mut engine, 0);
        let (conn_b, _rx_b) = connect(&mut engine, 0);
        engine
            .join_waiting(&conn_a, identity("alice"), topic("grief"), Mode::Text, 1)
            .unwrap();
        let MatchOutcome::Matched { room_id, .. } = engine
            .join_waiting(&conn_b, identity("bob"), topic("grief"), Mode::Text, 2)
            .unwrap()
        else {
            panic!("expected a match");
        };

        let poll = engine.poll_match(identity("alice"), topic("grief"), Mode::Text, 3);
        let MatchOutcome::Matched {
            room_id: poll_room, ..
        } = poll
        else {
            panic!("expected idempotent poll result");
        };
        assert_eq!(poll_room, room_id);
    }

    #[test]
    fn test_join_waiting_requires_registered_connection() {
        let mut engine = Engine::new();
        let conn = ConnectionId::generate();

        let result = engine.join_waiting(&conn, identity("alice"), topic("grief"), Mode::Text, 1);

        assert!(matches!(result, Err(EngineError::UnknownConnection(_))));
    }
}
