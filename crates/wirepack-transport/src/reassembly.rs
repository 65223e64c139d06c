//! Bounded arena for transmissions that arrive split across multiple raw
//! deliveries.
//!
//! Each in-flight transmission reserves its full expected size against the
//! arena's byte budget when opened, so a transmission that cannot fit fails
//! immediately rather than mid-reassembly. Completion or purging releases
//! the reservation.

use wirepack_core::error::{ErrorKind, Result};
use wirepack_protocol::message::{ChannelId, ConnectionId};

/// Outcome of appending a continuation chunk.
#[derive(Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The transmission is still incomplete; `consumed` bytes were taken
    /// from the chunk.
    Pending {
        /// Bytes consumed from the chunk.
        consumed: usize,
    },
    /// The transmission completed; `payload` holds the full wire bytes.
    Completed {
        /// The reassembled transmission bytes.
        payload: Vec<u8>,
        /// Bytes consumed from the chunk.
        consumed: usize,
    },
}

/// Bookkeeping for one transmission still arriving.
#[derive(Debug)]
struct InFlight {
    connection: ConnectionId,
    channel: ChannelId,
    total_size: usize,
    bytes: Vec<u8>,
}

impl InFlight {
    fn remaining(&self) -> usize {
        self.total_size - self.bytes.len()
    }
}

/// Fixed-budget arena of in-flight transmissions.
#[derive(Debug)]
pub struct ReassemblyArena {
    in_flight: Vec<InFlight>,
    capacity: usize,
    reserved: usize,
}

impl ReassemblyArena {
    /// Creates an arena with a budget of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { in_flight: Vec::new(), capacity, reserved: 0 }
    }

    /// Returns the bytes currently reserved by in-flight transmissions.
    pub fn reserved_bytes(&self) -> usize {
        self.reserved
    }

    /// Returns the arena's byte budget.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of in-flight transmissions.
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Opens an entry for a transmission of `total_size` bytes whose first
    /// chunk is `first_chunk`, reserving the full size against the budget.
    ///
    /// Fails with a capacity error when the reservation would overflow the
    /// budget; the chunk is then dropped by the caller.
    pub fn begin(
        &mut self,
        connection: ConnectionId,
        channel: ChannelId,
        total_size: usize,
        first_chunk: &[u8],
    ) -> Result<()> {
        debug_assert!(first_chunk.len() < total_size, "complete transmissions bypass the arena");
        let available = self.capacity - self.reserved;
        if total_size > available {
            return Err(ErrorKind::ReassemblyArenaFull { requested: total_size, available });
        }
        let mut bytes = Vec::with_capacity(total_size);
        bytes.extend_from_slice(first_chunk);
        self.in_flight.push(InFlight { connection, channel, total_size, bytes });
        self.reserved += total_size;
        Ok(())
    }

    /// Appends a continuation chunk to the in-flight transmission matching
    /// `(connection, channel)`.
    ///
    /// Consumes at most the bytes still missing; any surplus stays with the
    /// caller. On completion the entry is removed, its reservation released,
    /// and the full transmission bytes returned.
    pub fn append(
        &mut self,
        connection: ConnectionId,
        channel: ChannelId,
        chunk: &[u8],
    ) -> Result<AppendOutcome> {
        let index = self
            .in_flight
            .iter()
            .position(|e| e.connection == connection && e.channel == channel)
            .ok_or(ErrorKind::UnknownContinuation)?;

        let entry = &mut self.in_flight[index];
        let take = entry.remaining().min(chunk.len());
        entry.bytes.extend_from_slice(&chunk[..take]);

        if entry.remaining() == 0 {
            let done = self.in_flight.swap_remove(index);
            self.reserved -= done.total_size;
            Ok(AppendOutcome::Completed { payload: done.bytes, consumed: take })
        } else {
            Ok(AppendOutcome::Pending { consumed: take })
        }
    }

    /// Drops every in-flight transmission from `connection`, releasing its
    /// reservations. Returns how many were dropped.
    pub fn purge_connection(&mut self, connection: ConnectionId) -> usize {
        let before = self.in_flight.len();
        let mut released = 0;
        self.in_flight.retain(|e| {
            if e.connection == connection {
                released += e.total_size;
                false
            } else {
                true
            }
        });
        self.reserved -= released;
        before - self.in_flight.len()
    }
}
