//! Transmission encoding and decoding.
//!
//! # Module organization
//!
//! - [`encoder`] - Message batch encoding to the framed wire format
//! - [`decoder`] - Framed wire format decoding through the decoder registry

pub mod decoder;
pub mod encoder;


pub use decoder::{DecodedBatch, TransmissionDecoder};
pub use encoder::TransmissionEncoder;
