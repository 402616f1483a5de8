//! Waiting pool: participants queued for a partner, keyed by (topic, mode).

use crate::domain::{ConnectionId, Identity, Mode, Topic};

use super::PusherChannel;

/// A participant waiting to be paired.
///
/// `conn` and `sender` are `None` for entries created through the
/// polling endpoint, which has no persistent connection behind it.
pub struct WaitingEntry {
    pub conn: Option<ConnectionId>,
    pub sender: Option<PusherChannel>,
    pub identity: Identity,
    pub topic: Topic,
    pub mode: Mode,
    pub joined_at: i64,
}

impl WaitingEntry {
    /// Whether the connection behind this entry can still receive events.
    ///
    /// Polling entries have no connection to die, so they are always live.
    pub fn is_live(&self) -> bool {
        match &self.sender {
            Some(sender) => !sender.is_closed(),
            None => true,
        }
    }
}

/// FIFO pool of waiting participants.
///
/// Only the engine mutates this structure, always under the engine lock,
/// so scans and removals never interleave.
#[derive(Default)]
pub struct WaitingPool {
    entries: Vec<WaitingEntry>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry, superseding any prior entry with the same
    /// identity so a retrying participant never holds two queue slots.
    pub fn enqueue(&mut self, entry: WaitingEntry) {
        self.remove_identity(&entry.identity);
        self.entries.push(entry);
    }

    /// Remove the entry with the given identity, if present.
    pub fn remove_identity(&mut self, identity: &Identity) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.identity != *identity);
        self.entries.len() != before
    }

    /// Remove the entry owned by the given connection, if present.
    pub fn remove_conn(&mut self, conn: &ConnectionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.conn.as_ref() != Some(conn));
        self.entries.len() != before
    }

    /// First-fit FIFO scan: take the oldest live entry with the same
    /// topic and mode, excluding the caller's own identity.
    ///
    /// Dead entries walked past during the scan are pruned so a partner
    /// that disconnected between enqueue and match is never handed back.
    pub fn take_match(
        &mut self,
        topic: &Topic,
        mode: Mode,
        exclude: &Identity,
    ) -> Option<WaitingEntry> {
        let mut i = 0;
        while i < self.entries.len() {
            if !self.entries[i].is_live() {
                let stale = self.entries.remove(i);
                tracing::debug!(
                    "Pruned dead waiting entry for '{}' (topic '{}')",
                    stale.identity,
                    stale.topic
                );
                continue;
            }
            let entry = &self.entries[i];
            if entry.topic == *topic && entry.mode == mode && entry.identity != *exclude {
                return Some(self.entries.remove(i));
            }
            i += 1;
        }
        None
    }
}
