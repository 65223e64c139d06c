//! Transmission encoding.
//!
//! Serializes a batch of messages into one framed transmission: header first
//! with a zero length field, then each message, then the total length is
//! back-patched into the header.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use wirepack_core::{
    constants::HEADER_MAGIC,
    error::{ErrorKind, Result},
};

use crate::{
    header::TransmissionHeader,
    message::{Message, MessageFlags},
};

/// Serializes message batches into framed transmissions.
pub struct TransmissionEncoder;

impl TransmissionEncoder {
    /// Encodes `messages` as one transmission into a fresh buffer.
    pub fn encode_transmission(messages: &[Message]) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(TransmissionHeader::SIZE + messages.len() * 16);
        Self::encode_transmission_into(&mut buffer, messages)?;
        Ok(buffer)
    }

    /// Encodes `messages` as one transmission, appending to `buffer`.
    /// Returns the number of bytes written.
    pub fn encode_transmission_into(buffer: &mut Vec<u8>, messages: &[Message]) -> Result<usize> {
        if messages.is_empty() {
            return Err(ErrorKind::EmptyTransmission);
        }

        let start = buffer.len();
        buffer.write_u32::<BigEndian>(HEADER_MAGIC)?;
        // Length is not known yet; back-patched below.
        buffer.write_u32::<BigEndian>(0)?;

        for message in messages {
            Self::encode_message_into(buffer, message)?;
        }

        let total = buffer.len() - start;
        let len_field = start + 4;
        buffer[len_field..len_field + 4].copy_from_slice(&(total as u32).to_be_bytes());
        Ok(total)
    }

    /// Encodes a single message (type tag, base fields, body), appending to
    /// `buffer`. Returns the number of bytes written.
    pub fn encode_message_into(buffer: &mut Vec<u8>, message: &Message) -> Result<usize> {
        let start = buffer.len();
        buffer.write_u32::<BigEndian>(message.raw_type().raw())?;
        buffer.write_u32::<BigEndian>(message.packet_id())?;
        buffer.write_u32::<BigEndian>(message.flags().bits())?;
        if message.flags().contains(MessageFlags::ACK_REQUESTED) {
            buffer.write_u32::<BigEndian>(message.ack_id())?;
        }
        buffer.write_all(message.body())?;
        Ok(buffer.len() - start)
    }
}
