//! Message record and its tag/flag types.
//!
//! A `Message` is a plain value record: a two-level type tag, a packet id, an
//! acknowledgement id, a flag bitset, and the message-kind body bytes that a
//! registered decoder family defines for itself. Batching and the identity of
//! the remote end live on the holder of the message sequence, not on the
//! message itself.

use bitflags::bitflags;

use wirepack_core::{
    constants::ACK_MAJOR_TYPE,
    error::{ErrorKind, Result},
};

/// Identifies a remote endpoint as seen by the caller's socket layer.
pub type ConnectionId = u32;

/// Identifies a local channel within a connection.
pub type ChannelId = u32;

bitflags! {
    /// Per-message flag bitset carried on the wire.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MessageFlags: u32 {
        /// The sender wants this transmission acknowledged and will resend
        /// it until the acknowledgement arrives.
        const ACK_REQUESTED = 1 << 0;
    }
}

/// Two-level message type tag: `major << 16 | sub`.
///
/// The major half selects the decoder family; the sub half differentiates
/// message kinds within that family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawType(u32);

impl RawType {
    /// Builds a tag from its major and sub halves.
    pub fn from_parts(major: u16, sub: u16) -> Self {
        Self((u32::from(major) << 16) | u32::from(sub))
    }

    /// Builds a tag from the raw wire value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw wire value.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Returns the major half selecting the decoder family.
    pub fn major(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Returns the sub half differentiating within the family.
    pub fn sub(&self) -> u16 {
        self.0 as u16
    }
}

/// One logical unit of the protocol.
///
/// `body` holds the message-kind extension bytes exactly as they appear on
/// the wire after the base fields; the decoder family owning the major type
/// defines their layout. The reserved acknowledgement kind has an empty body
/// and carries the acknowledged id in `packet_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    raw_type: RawType,
    packet_id: u32,
    ack_id: u32,
    flags: MessageFlags,
    body: Vec<u8>,
}

impl Message {
    /// Creates a message without extension bytes.
    pub fn new(raw_type: RawType, packet_id: u32, flags: MessageFlags) -> Self {
        Self { raw_type, packet_id, ack_id: 0, flags, body: Vec::new() }
    }

    /// Creates a message with raw extension bytes.
    ///
    /// The bytes are written to the wire verbatim; the decoder registered for
    /// `raw_type`'s major half must know how to read them back. For a
    /// ready-made length-prefixed layout use [`Message::with_payload`].
    pub fn with_body(raw_type: RawType, packet_id: u32, flags: MessageFlags, body: Vec<u8>) -> Self {
        Self { raw_type, packet_id, ack_id: 0, flags, body }
    }

    /// Creates a message whose body is a u16-length-prefixed payload, the
    /// layout understood by
    /// [`decode_payload_message`](crate::wire_codec::decoder::decode_payload_message).
    ///
    /// Fails with [`ErrorKind::PayloadTooLarge`] when the payload does not
    /// fit the length prefix; a truncated prefix would desynchronize the
    /// decoder from the message stream.
    pub fn with_payload(
        raw_type: RawType,
        packet_id: u32,
        flags: MessageFlags,
        payload: &[u8],
    ) -> Result<Self> {
        if payload.len() > u16::MAX as usize {
            return Err(ErrorKind::PayloadTooLarge(payload.len()));
        }
        let mut body = Vec::with_capacity(2 + payload.len());
        body.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        body.extend_from_slice(payload);
        Ok(Self { raw_type, packet_id, ack_id: 0, flags, body })
    }

    /// Creates the reserved acknowledgement message for `ack_id`.
    pub fn ack(ack_id: u32) -> Self {
        Self {
            raw_type: RawType::from_parts(ACK_MAJOR_TYPE, 0),
            packet_id: ack_id,
            ack_id: 0,
            flags: MessageFlags::empty(),
            body: Vec::new(),
        }
    }

    /// Returns the two-level type tag.
    pub fn raw_type(&self) -> RawType {
        self.raw_type
    }

    /// Returns the packet id identifying this message instance.
    pub fn packet_id(&self) -> u32 {
        self.packet_id
    }

    /// Returns the id a matching acknowledgement will carry as its packet id.
    pub fn ack_id(&self) -> u32 {
        self.ack_id
    }

    /// Sets the acknowledgement id. Assigned by the transport when an
    /// ack-requested message enters the outgoing table.
    pub fn set_ack_id(&mut self, ack_id: u32) {
        self.ack_id = ack_id;
    }

    /// Returns the flag bitset.
    pub fn flags(&self) -> MessageFlags {
        self.flags
    }

    /// Returns the raw extension bytes following the base fields.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the payload of a u16-length-prefixed body.
    ///
    /// Returns an empty slice when the body does not follow that layout
    /// (no prefix, or a prefix that disagrees with the remaining length);
    /// only messages built with [`Message::with_payload`] or decoded by the
    /// payload decoder are guaranteed to have one.
    pub fn payload(&self) -> &[u8] {
        if self.body.len() >= 2 {
            let declared = u16::from_be_bytes([self.body[0], self.body[1]]) as usize;
            if declared == self.body.len() - 2 {
                return &self.body[2..];
            }
        }
        &[]
    }

    /// Returns true for the reserved acknowledgement kind.
    pub fn is_ack(&self) -> bool {
        self.raw_type.major() == ACK_MAJOR_TYPE
    }

    /// Returns true if this message should be tracked for acknowledgement.
    /// The reserved ack kind is exempt: acks are never acked themselves.
    pub fn wants_ack(&self) -> bool {
        self.flags.contains(MessageFlags::ACK_REQUESTED) && !self.is_ack()
    }
}
