#![warn(missing_docs)]

//! wirepack-core: foundational types shared across all layers.
//!
//! This crate provides the minimal set of utilities the protocol and
//! transport layers build on:
//! - Configuration types
//! - Error handling
//! - Protocol constants
//!
//! Protocol-specific logic lives in the specialized crates:
//! - `wirepack-protocol`: message record, transmission header, wire codec,
//!   decoder registry
//! - `wirepack-transport`: outgoing table, reassembly arena, manager

/// Protocol constants shared across layers.
pub mod constants {
    /// Magic value opening every framed transmission ("LWPK").
    pub const HEADER_MAGIC: u32 = 0x4C57_504B;
    /// Size of the transmission header in bytes (magic + total length).
    pub const TRANSMISSION_HEADER_SIZE: usize = 8;
    /// Major type reserved for acknowledgement messages.
    pub const ACK_MAJOR_TYPE: u16 = 0;
    /// Default capacity of the outgoing table, in entries.
    pub const DEFAULT_MAX_OUTGOING: usize = 1024;
    /// Default byte budget of the reassembly arena.
    pub const DEFAULT_REASSEMBLY_CAPACITY: usize = 256 * 1024;
    /// Default number of clock-resolution ticks between resends of an
    /// unacknowledged transmission.
    pub const DEFAULT_RESEND_FREQUENCY: u32 = 3;
}

/// Configuration options for the transport.
pub mod config;
/// Error types and results.
pub mod error;
