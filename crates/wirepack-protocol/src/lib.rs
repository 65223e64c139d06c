#![warn(missing_docs)]

//! wirepack-protocol: message record, transmission header, and wire codec.
//!
//! A *transmission* is the wire unit: a fixed header (magic + total length)
//! followed by one or more encoded messages. Each message opens with a
//! two-level type tag; the major half selects the decoder family registered
//! for it, the sub half differentiates within that family.

/// Transmission header framing every wire unit.
pub mod header;
/// The message value record and its type tag / flag types.
pub mod message;
/// Decode-handler table keyed by major type.
pub mod registry;
/// Transmission encoding and decoding.
pub mod wire_codec;

pub use header::TransmissionHeader;
pub use message::{ChannelId, ConnectionId, Message, MessageFlags, RawType};
pub use registry::{DecodeFn, DecoderRegistry};
pub use wire_codec::{DecodedBatch, TransmissionDecoder, TransmissionEncoder};
