#![warn(missing_docs)]

//! wirepack-transport: turns a lossy, MTU-limited byte channel into batched,
//! reassembled, optionally acknowledged message delivery.
//!
//! The [`TransportManager`] performs no I/O: raw bytes are pushed in through
//! [`TransportManager::process_raw_data`] and framed transmissions are pulled
//! out through the caller-supplied [`LinkSink`] during
//! [`TransportManager::update`]. All buffers are bounded at construction and
//! never grow.

/// Manager orchestrating framing, reassembly, ack matching and resends.
pub mod manager;
/// Bounded table of pending outgoing transmissions.
pub mod outgoing;
/// Bounded arena for transmissions arriving across multiple deliveries.
pub mod reassembly;

pub use manager::{IngestReport, LinkRecipient, LinkSink, Transmission, TransportManager};
pub use outgoing::{OutgoingEntry, OutgoingTable};
pub use reassembly::{AppendOutcome, ReassemblyArena};
