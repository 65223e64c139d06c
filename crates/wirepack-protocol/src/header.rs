//! Transmission header framing every wire unit.

use wirepack_core::{
    constants::{HEADER_MAGIC, TRANSMISSION_HEADER_SIZE},
    error::{ErrorKind, Result},
};

/// Wire prefix of every transmission: the magic constant followed by the
/// total transmission length in bytes, header included. Both fields are
/// big-endian u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionHeader {
    /// Total length of the transmission in bytes, including this header.
    pub total_len: u32,
}

impl TransmissionHeader {
    /// Encoded size of the header in bytes.
    pub const SIZE: usize = TRANSMISSION_HEADER_SIZE;

    /// Returns true if `data` opens with the header magic, i.e. the chunk
    /// starts a new transmission rather than continuing one.
    pub fn starts_transmission(data: &[u8]) -> bool {
        match data.get(..4) {
            Some(prefix) => u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) == HEADER_MAGIC,
            None => false,
        }
    }

    /// Reads the header at the start of `data` without consuming it.
    ///
    /// Fails if fewer than [`Self::SIZE`] bytes are available, the magic does
    /// not match, or the recorded length is shorter than the header itself.
    pub fn peek(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(ErrorKind::CouldNotReadHeader(format!(
                "need {} bytes, got {}",
                Self::SIZE,
                data.len()
            )));
        }
        let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if magic != HEADER_MAGIC {
            return Err(ErrorKind::CouldNotReadHeader(format!(
                "bad magic {magic:#010x}, expected {HEADER_MAGIC:#010x}"
            )));
        }
        let total_len = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if (total_len as usize) < Self::SIZE {
            return Err(ErrorKind::CouldNotReadHeader(format!(
                "recorded length {total_len} shorter than header"
            )));
        }
        Ok(Self { total_len })
    }
}
