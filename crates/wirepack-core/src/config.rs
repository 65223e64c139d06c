use std::default::Default;

use crate::constants::{
    DEFAULT_MAX_OUTGOING, DEFAULT_REASSEMBLY_CAPACITY, DEFAULT_RESEND_FREQUENCY,
};

/// Configuration options to tune transport behavior.
///
/// All capacities are fixed at construction time; the transport never grows
/// its buffers past these bounds.
#[derive(Clone, Debug)]
pub struct Config {
    /// Max number of pending outgoing transmissions. A push beyond this
    /// bound fails and the caller keeps the messages.
    pub max_outgoing: usize,
    /// Byte budget of the reassembly arena holding transmissions that are
    /// still arriving across multiple raw deliveries.
    pub reassembly_capacity: usize,
    /// Number of clock-resolution ticks to wait before re-offering an
    /// unacknowledged transmission to the send sink.
    pub resend_frequency: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_outgoing: DEFAULT_MAX_OUTGOING,
            reassembly_capacity: DEFAULT_REASSEMBLY_CAPACITY,
            resend_frequency: DEFAULT_RESEND_FREQUENCY,
        }
    }
}
