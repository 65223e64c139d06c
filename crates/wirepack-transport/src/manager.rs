//! Transport orchestration: framing, reassembly, ack matching and resends.

use std::time::{Duration, Instant};

use wirepack_core::{
    config::Config,
    error::{ErrorKind, Result},
};
use wirepack_protocol::{
    header::TransmissionHeader,
    message::{ChannelId, ConnectionId, Message},
    registry::{DecodeFn, DecoderRegistry},
    wire_codec::{TransmissionDecoder, TransmissionEncoder},
};

use crate::{
    outgoing::{OutgoingEntry, OutgoingTable},
    reassembly::{AppendOutcome, ReassemblyArena},
};

/// A decoded batch of messages together with the identity of the remote end
/// it arrived from. Only the holder carries that identity; the messages are
/// plain value records.
#[derive(Debug)]
pub struct Transmission {
    /// Remote endpoint the transmission arrived from.
    pub connection: ConnectionId,
    /// Local channel it arrived on.
    pub channel: ChannelId,
    /// Messages in wire order.
    pub messages: Vec<Message>,
}

/// Egress seam: receives framed transmissions ready for the wire.
///
/// Returning `true` confirms delivery out-of-band and retires the entry even
/// when an acknowledgement was requested; `false` leaves ack-requested
/// entries pending for the resend timer. Entries without an ack request are
/// retired after the first offer regardless of the return value.
pub trait LinkSink {
    /// Offers one framed transmission for sending.
    fn transmit(&mut self, connection: ConnectionId, channel: ChannelId, frame: &[u8]) -> bool;
}

/// Ingress seam: receives decoded transmissions.
pub trait LinkRecipient {
    /// Delivers a decoded transmission. Returning `false` declines it; the
    /// transmission is dropped either way, but an ack is still generated for
    /// ack-requested leads.
    fn deliver(&mut self, transmission: Transmission) -> bool;
}

/// Summary of one `process_raw_data` call.
///
/// Distinguishes the three ways a decode can stop short of a full chain:
/// malformed bytes fail the call itself, still-arriving chunks are counted
/// as `buffered`, and unsupported major types as `truncated`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Transmissions decoded and handed to the recipient.
    pub dispatched: usize,
    /// Chunks parked in the reassembly arena awaiting more bytes.
    pub buffered: usize,
    /// Acknowledgements matched against the outgoing table.
    pub acks_matched: usize,
    /// Transmissions whose decode stopped at an unregistered major type.
    pub truncated: usize,
}

/// Converts a lossy, MTU-limited transport into batched, reassembled,
/// optionally acknowledged message delivery.
///
/// Single-threaded and call-driven: the caller serializes
/// [`process_raw_data`](Self::process_raw_data),
/// [`update`](Self::update) and [`push_outgoing`](Self::push_outgoing)
/// against each other and drives `update` from its main loop.
pub struct TransportManager {
    registry: DecoderRegistry,
    outgoing: OutgoingTable,
    arena: ReassemblyArena,
    next_ack_id: u32,
    resend_frequency: u32,
}

impl TransportManager {
    /// Creates a manager with all buffers sized from `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            registry: DecoderRegistry::new(),
            outgoing: OutgoingTable::with_capacity(config.max_outgoing),
            arena: ReassemblyArena::with_capacity(config.reassembly_capacity),
            next_ack_id: 1,
            resend_frequency: config.resend_frequency,
        }
    }

    /// Installs a decoder for `major`, returning the one it replaced. The
    /// acknowledgement decoder is installed at construction.
    pub fn register_decoder(&mut self, major: u16, decode: DecodeFn) -> Option<DecodeFn> {
        self.registry.register(major, decode)
    }

    /// Serializes `messages` into one framed transmission.
    pub fn serialize_transmission(&self, messages: &[Message]) -> Result<Vec<u8>> {
        TransmissionEncoder::encode_transmission(messages)
    }

    /// Decodes the complete transmission in `data`, stamping it with the
    /// given identity. The decode may be truncated at an unregistered major
    /// type; the messages decoded before the stop are returned.
    pub fn decode_transmission(
        &self,
        connection: ConnectionId,
        channel: ChannelId,
        data: &[u8],
    ) -> Result<Transmission> {
        let batch = TransmissionDecoder::decode_transmission(data, &self.registry)?;
        if let Some(major) = batch.stopped_at {
            tracing::warn!(major, "no decoder registered, transmission truncated");
        }
        Ok(Transmission { connection, channel, messages: batch.messages })
    }

    /// Ingress entry point: consumes one raw delivery from the socket layer.
    ///
    /// A delivery may start a transmission (decoded immediately when whole,
    /// parked in the arena when split), continue one already in flight, and
    /// carry several transmissions back to back; every complete transmission
    /// is dispatched before the call returns.
    pub fn process_raw_data<R: LinkRecipient>(
        &mut self,
        connection: ConnectionId,
        channel: ChannelId,
        data: &[u8],
        recipient: &mut R,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut rest = data;

        while !rest.is_empty() {
            let consumed = if TransmissionHeader::starts_transmission(rest) {
                let header = TransmissionHeader::peek(rest)?;
                let total = header.total_len as usize;
                if total <= rest.len() {
                    self.dispatch(connection, channel, &rest[..total], recipient, &mut report)?;
                    total
                } else {
                    self.arena.begin(connection, channel, total, rest)?;
                    report.buffered += 1;
                    rest.len()
                }
            } else {
                match self.arena.append(connection, channel, rest)? {
                    AppendOutcome::Completed { payload, consumed } => {
                        self.dispatch(connection, channel, &payload, recipient, &mut report)?;
                        consumed
                    }
                    AppendOutcome::Pending { consumed } => {
                        report.buffered += 1;
                        consumed
                    }
                }
            };
            rest = &rest[consumed..];
        }

        Ok(report)
    }

    /// Egress entry point: offers every due pending transmission to `sink`.
    ///
    /// Entries that requested no acknowledgement, or whose delivery the sink
    /// confirmed, are retired; the rest are rescheduled at
    /// `now + resolution * resend_frequency`. This is the only place pending
    /// entries leave the table other than ack matching and purging.
    /// Returns the number of frames offered.
    pub fn update<S: LinkSink>(
        &mut self,
        now: Instant,
        resolution: Duration,
        sink: &mut S,
    ) -> Result<usize> {
        let mut offered = 0;
        let mut index = 0;
        while index < self.outgoing.len() {
            let frame = match self.outgoing.get(index) {
                Some(entry) if entry.is_due(now) => {
                    TransmissionEncoder::encode_transmission(&entry.messages)?
                }
                _ => {
                    index += 1;
                    continue;
                }
            };

            let Some(entry) = self.outgoing.get_mut(index) else { break };
            let confirmed = sink.transmit(entry.connection, entry.channel, &frame);
            offered += 1;

            if entry.ack_id.is_none() || confirmed {
                self.outgoing.swap_remove(index);
                // The swapped-in entry is examined at the same index.
            } else {
                entry.send_at = Some(now + resolution * self.resend_frequency);
                index += 1;
            }
        }
        Ok(offered)
    }

    /// Queues `messages` as one outgoing transmission, due on the next
    /// [`update`](Self::update).
    ///
    /// Fails with a typed capacity error when the table is full; the caller
    /// keeps the messages. An ack-requested lead is assigned the next
    /// acknowledgement id, which is returned; ack messages themselves are
    /// never tracked (no ack-of-ack).
    pub fn push_outgoing(
        &mut self,
        connection: ConnectionId,
        channel: ChannelId,
        mut messages: Vec<Message>,
    ) -> Result<Option<u32>> {
        let lead = messages.first().ok_or(ErrorKind::EmptyTransmission)?;
        if self.outgoing.is_full() {
            return Err(ErrorKind::OutgoingTableFull(self.outgoing.capacity()));
        }

        let ack_id = if lead.wants_ack() {
            let id = self.next_ack_id;
            self.next_ack_id = self.next_ack_id.wrapping_add(1);
            messages[0].set_ack_id(id);
            Some(id)
        } else {
            None
        };

        self.outgoing.push(OutgoingEntry { connection, channel, messages, ack_id, send_at: None })?;
        Ok(ack_id)
    }

    /// Drops all pending outgoing entries and in-flight reassemblies for a
    /// disconnected connection.
    pub fn purge_connection(&mut self, connection: ConnectionId) {
        let dropped_outgoing = self.outgoing.purge_connection(connection);
        let dropped_in_flight = self.arena.purge_connection(connection);
        if dropped_outgoing > 0 || dropped_in_flight > 0 {
            tracing::debug!(
                connection,
                dropped_outgoing,
                dropped_in_flight,
                "purged disconnected connection"
            );
        }
    }

    /// Returns the number of pending outgoing transmissions.
    pub fn outgoing_len(&self) -> usize {
        self.outgoing.len()
    }

    /// Returns the number of transmissions still being reassembled.
    pub fn reassembling_len(&self) -> usize {
        self.arena.len()
    }

    fn dispatch<R: LinkRecipient>(
        &mut self,
        connection: ConnectionId,
        channel: ChannelId,
        wire: &[u8],
        recipient: &mut R,
        report: &mut IngestReport,
    ) -> Result<()> {
        let batch = TransmissionDecoder::decode_transmission(wire, &self.registry)?;
        if let Some(major) = batch.stopped_at {
            report.truncated += 1;
            tracing::warn!(major, "no decoder registered, transmission truncated");
        }

        let Some(lead) = batch.messages.first() else { return Ok(()) };

        if lead.is_ack() {
            let ack_id = lead.packet_id();
            if self.outgoing.take_acked(ack_id).is_some() {
                report.acks_matched += 1;
                tracing::trace!(ack_id, "acknowledged, retired outgoing transmission");
            } else {
                tracing::trace!(ack_id, "acknowledgement matched no pending transmission");
            }
            return Ok(());
        }

        let wants_ack = lead.wants_ack();
        let ack_id = lead.ack_id();

        let accepted =
            recipient.deliver(Transmission { connection, channel, messages: batch.messages });
        report.dispatched += 1;
        if !accepted {
            tracing::trace!(connection, channel, "recipient declined transmission");
        }

        if wants_ack {
            // Best effort: when the table is full the sender's own resend
            // timer covers the lost ack.
            if let Err(err) = self.push_outgoing(connection, channel, vec![Message::ack(ack_id)]) {
                tracing::warn!(connection, ack_id, %err, "dropping acknowledgement");
            }
        }
        Ok(())
    }
}
