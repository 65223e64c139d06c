//! Transmission decoding.
//!
//! Walks the message stream inside a framed transmission, dispatching each
//! message to the decoder registered for its major type. Decoding stops
//! early, keeping what was decoded, when a major type has no registered
//! decoder; malformed bytes fail the whole transmission.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use wirepack_core::error::{DecodingErrorKind, ErrorKind, Result};

use crate::{
    header::TransmissionHeader,
    message::{Message, MessageFlags, RawType},
    registry::DecoderRegistry,
};

/// Result of decoding one transmission.
#[derive(Debug)]
pub struct DecodedBatch {
    /// Messages decoded, in wire order.
    pub messages: Vec<Message>,
    /// Major type that stopped decoding because no decoder was registered
    /// for it, if any. Messages before the stop are kept.
    pub stopped_at: Option<u16>,
}

/// Deserializes framed transmissions through a decoder registry.
pub struct TransmissionDecoder;

impl TransmissionDecoder {
    /// Decodes the transmission at the start of `data`.
    ///
    /// `data` must hold the complete transmission; the recorded total length
    /// bounds how far the message stream is read.
    pub fn decode_transmission(data: &[u8], registry: &DecoderRegistry) -> Result<DecodedBatch> {
        let header = TransmissionHeader::peek(data)?;
        let total = header.total_len as usize;
        let stream = data
            .get(TransmissionHeader::SIZE..total)
            .ok_or(ErrorKind::DecodingError(DecodingErrorKind::UnexpectedEof))?;

        let mut cursor = Cursor::new(stream);
        let mut messages = Vec::new();
        let mut stopped_at = None;

        while (cursor.position() as usize) < stream.len() {
            let raw_type = RawType::from_raw(cursor.read_u32::<BigEndian>()?);
            match registry.get(raw_type.major()) {
                Some(decode) => messages.push(decode(&mut cursor, raw_type)?),
                None => {
                    stopped_at = Some(raw_type.major());
                    break;
                }
            }
        }

        Ok(DecodedBatch { messages, stopped_at })
    }
}

/// Base fields every message opens with, read by decoder handlers before
/// their own extension bytes.
#[derive(Debug, Clone, Copy)]
pub struct BaseFields {
    /// Packet id of the message instance.
    pub packet_id: u32,
    /// Flag bitset.
    pub flags: MessageFlags,
    /// Acknowledgement id; present on the wire only when `ACK_REQUESTED`
    /// is set, zero otherwise.
    pub ack_id: u32,
}

/// Reads the base field layout shared by all message kinds.
pub fn decode_base_fields(cursor: &mut Cursor<&[u8]>) -> Result<BaseFields> {
    let packet_id = cursor.read_u32::<BigEndian>()?;
    let bits = cursor.read_u32::<BigEndian>()?;
    let flags = MessageFlags::from_bits(bits)
        .ok_or(ErrorKind::DecodingError(DecodingErrorKind::MessageFlags))?;
    let ack_id = if flags.contains(MessageFlags::ACK_REQUESTED) {
        cursor.read_u32::<BigEndian>()?
    } else {
        0
    };
    Ok(BaseFields { packet_id, flags, ack_id })
}

/// Decoder for the reserved acknowledgement kind: base fields, no body.
pub fn decode_ack(cursor: &mut Cursor<&[u8]>, raw_type: RawType) -> Result<Message> {
    let base = decode_base_fields(cursor)?;
    let mut message = Message::new(raw_type, base.packet_id, base.flags);
    message.set_ack_id(base.ack_id);
    Ok(message)
}

/// Ready-made decoder for message kinds whose body is a u16-length-prefixed
/// payload, the counterpart of [`Message::with_payload`]. Register it for
/// any major type encoded that way.
pub fn decode_payload_message(cursor: &mut Cursor<&[u8]>, raw_type: RawType) -> Result<Message> {
    let base = decode_base_fields(cursor)?;
    let len = cursor.read_u16::<BigEndian>()? as usize;
    let mut payload = vec![0u8; len];
    cursor.read_exact(&mut payload)?;
    let mut message = Message::with_payload(raw_type, base.packet_id, base.flags, &payload)?;
    message.set_ack_id(base.ack_id);
    Ok(message)
}
