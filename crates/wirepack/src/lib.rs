#![warn(missing_docs)]

//! Wirepack: a small public API facade for the workspace.
//!
//! This crate re-exports the types needed to layer reliable, batched
//! message delivery over an unreliable datagram channel the caller owns:
//!
//! - The manager and its seams (`TransportManager`, `LinkSink`,
//!   `LinkRecipient`, `Transmission`)
//! - Message types and tags (`Message`, `MessageFlags`, `RawType`)
//! - Core configuration (`Config`)
//!
//! Example
//! ```
//! use std::time::{Duration, Instant};
//! use wirepack::{
//!     decode_payload_message, Config, LinkRecipient, Message, MessageFlags, RawType,
//!     Transmission, TransportManager,
//! };
//!
//! struct Printer;
//! impl LinkRecipient for Printer {
//!     fn deliver(&mut self, t: Transmission) -> bool {
//!         println!("{} message(s) from connection {}", t.messages.len(), t.connection);
//!         true
//!     }
//! }
//!
//! let mut manager = TransportManager::new(&Config::default());
//! manager.register_decoder(1, decode_payload_message);
//!
//! // Frame a message and feed it back in, as a socket layer would.
//! let msg = Message::with_payload(RawType::from_parts(1, 0), 1, MessageFlags::empty(), b"hi")
//!     .unwrap();
//! let frame = manager.serialize_transmission(&[msg]).unwrap();
//! let report = manager.process_raw_data(1, 0, &frame, &mut Printer).unwrap();
//! assert_eq!(report.dispatched, 1);
//! ```

// Core config and errors
pub use wirepack_core::{
    config::Config,
    error::{DecodingErrorKind, ErrorKind, Result},
};
// Protocol: messages, tags, header, codec and registry
pub use wirepack_protocol::{
    header::TransmissionHeader,
    message::{ChannelId, ConnectionId, Message, MessageFlags, RawType},
    registry::{DecodeFn, DecoderRegistry},
    wire_codec::decoder::{decode_base_fields, decode_payload_message, BaseFields},
    wire_codec::{DecodedBatch, TransmissionDecoder, TransmissionEncoder},
};
// Transport: the manager and its seams
pub use wirepack_transport::{
    IngestReport, LinkRecipient, LinkSink, Transmission, TransportManager,
};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        decode_payload_message, ChannelId, Config, ConnectionId, ErrorKind, IngestReport,
        LinkRecipient, LinkSink, Message, MessageFlags, RawType, Result, Transmission,
        TransportManager,
    };
}
