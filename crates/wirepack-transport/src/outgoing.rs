//! Bounded table of pending outgoing transmissions.
//!
//! Entries stay in the table until they are acknowledged, confirmed by the
//! send sink, or purged with their connection. Removal swaps with the last
//! entry; order across entries is not contractual.

use std::time::Instant;

use wirepack_core::error::{ErrorKind, Result};
use wirepack_protocol::message::{ChannelId, ConnectionId, Message};

/// One pending outgoing transmission.
#[derive(Debug)]
pub struct OutgoingEntry {
    /// Remote endpoint the transmission is addressed to.
    pub connection: ConnectionId,
    /// Local channel the transmission belongs to.
    pub channel: ChannelId,
    /// Messages batched into this transmission, in wire order.
    pub messages: Vec<Message>,
    /// Acknowledgement id assigned to an ack-requested lead, if any.
    /// Entries without one are retired after their first send.
    pub ack_id: Option<u32>,
    /// Next time the entry is due; `None` means due immediately.
    pub send_at: Option<Instant>,
}

impl OutgoingEntry {
    /// Returns true if the entry should be offered to the sink at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.send_at {
            None => true,
            Some(at) => at <= now,
        }
    }
}

/// Fixed-capacity table of pending outgoing transmissions.
#[derive(Debug)]
pub struct OutgoingTable {
    entries: Vec<OutgoingEntry>,
    capacity: usize,
}

impl OutgoingTable {
    /// Creates a table holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity), capacity }
    }

    /// Returns the number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the table is at capacity.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Returns the fixed capacity in entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an entry, failing when the table is at capacity.
    pub fn push(&mut self, entry: OutgoingEntry) -> Result<()> {
        if self.is_full() {
            return Err(ErrorKind::OutgoingTableFull(self.capacity));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Returns the entry at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<&OutgoingEntry> {
        self.entries.get(index)
    }

    /// Returns the entry at `index` mutably, if in bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut OutgoingEntry> {
        self.entries.get_mut(index)
    }

    /// Removes and returns the entry at `index` by swapping with the last.
    pub fn swap_remove(&mut self, index: usize) -> OutgoingEntry {
        self.entries.swap_remove(index)
    }

    /// Removes and returns the entry whose assigned ack id is `ack_id`.
    pub fn take_acked(&mut self, ack_id: u32) -> Option<OutgoingEntry> {
        let index = self.entries.iter().position(|e| e.ack_id == Some(ack_id))?;
        Some(self.entries.swap_remove(index))
    }

    /// Removes every entry addressed to `connection`. Returns how many were
    /// dropped.
    pub fn purge_connection(&mut self, connection: ConnectionId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.connection != connection);
        before - self.entries.len()
    }

    /// Iterates over the pending entries.
    pub fn iter(&self) -> impl Iterator<Item = &OutgoingEntry> {
        self.entries.iter()
    }
}
