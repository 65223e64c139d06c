//! Decode-handler table keyed by major type.

use std::{collections::HashMap, io::Cursor};

use wirepack_core::{constants::ACK_MAJOR_TYPE, error::Result};

use crate::{message::Message, message::RawType, wire_codec::decoder};

/// Decoder installed for one major type.
///
/// The handler is called with the cursor positioned just past the type tag
/// and must consume exactly the bytes its message kind wrote. Handlers read
/// the base fields first (see
/// [`decode_base_fields`](crate::wire_codec::decoder::decode_base_fields))
/// and then their own extension bytes.
pub type DecodeFn = fn(&mut Cursor<&[u8]>, RawType) -> Result<Message>;

/// Registry mapping each major type to its decoder.
///
/// The reserved acknowledgement major type is installed at construction;
/// applications register a decoder per major type they emit. A transmission
/// containing a major type with no registered decoder stops decoding at that
/// message.
#[derive(Debug, Clone)]
pub struct DecoderRegistry {
    handlers: HashMap<u16, DecodeFn>,
}

impl DecoderRegistry {
    /// Creates a registry with the acknowledgement decoder pre-registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<u16, DecodeFn> = HashMap::new();
        handlers.insert(ACK_MAJOR_TYPE, decoder::decode_ack as DecodeFn);
        Self { handlers }
    }

    /// Installs `decode` for `major`, returning the decoder it replaced.
    pub fn register(&mut self, major: u16, decode: DecodeFn) -> Option<DecodeFn> {
        self.handlers.insert(major, decode)
    }

    /// Returns the decoder for `major`, if one is registered.
    pub fn get(&self, major: u16) -> Option<DecodeFn> {
        self.handlers.get(&major).copied()
    }

    /// Returns true if a decoder is registered for `major`.
    pub fn contains(&self, major: u16) -> bool {
        self.handlers.contains_key(&major)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
