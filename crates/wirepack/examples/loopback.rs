//! Two managers exchanging reliable messages over an in-process lossy link.
//!
//! Frames travel through crossbeam channels standing in for a datagram
//! socket; the link deliberately drops the first copy of every frame so the
//! resend timer has work to do.
//!
//! Run with:
//! - cargo run -p wirepack --example loopback
//! - cargo run -p wirepack --example loopback -- 10
//!   (sends 10 reliable messages)

use std::{
    env, thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Sender};

use wirepack::{
    decode_payload_message, ChannelId, Config, ConnectionId, LinkRecipient, LinkSink, Message,
    MessageFlags, RawType, Transmission, TransportManager,
};

const DATA_MAJOR: u16 = 1;
const RESOLUTION: Duration = Duration::from_millis(16);

/// Sends frames into a channel, dropping the first copy of each to force a
/// resend.
struct LossyLink {
    tx: Sender<Vec<u8>>,
    sent: usize,
}

impl LinkSink for LossyLink {
    fn transmit(&mut self, _conn: ConnectionId, _chan: ChannelId, frame: &[u8]) -> bool {
        self.sent += 1;
        if self.sent % 2 == 1 {
            println!("  link: dropped a frame ({} bytes)", frame.len());
        } else {
            let _ = self.tx.send(frame.to_vec());
        }
        false
    }
}

struct Printer {
    name: &'static str,
}

impl LinkRecipient for Printer {
    fn deliver(&mut self, transmission: Transmission) -> bool {
        for message in &transmission.messages {
            println!(
                "  {}: got packet {} ({:?})",
                self.name,
                message.packet_id(),
                String::from_utf8_lossy(message.payload())
            );
        }
        true
    }
}

fn new_manager() -> TransportManager {
    let mut manager = TransportManager::new(&Config::default());
    manager.register_decoder(DATA_MAJOR, decode_payload_message);
    manager
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let count: u32 = env::args().nth(1).unwrap_or_else(|| "3".into()).parse().unwrap_or(3);

    let mut alice = new_manager();
    let mut bob = new_manager();

    let (to_bob_tx, to_bob_rx) = unbounded::<Vec<u8>>();
    let (to_alice_tx, to_alice_rx) = unbounded::<Vec<u8>>();
    let mut alice_link = LossyLink { tx: to_bob_tx, sent: 0 };
    let mut bob_link = LossyLink { tx: to_alice_tx, sent: 0 };
    let mut bob_app = Printer { name: "bob" };
    let mut alice_app = Printer { name: "alice" };

    for i in 0..count {
        let payload = format!("hello {i}");
        let message = Message::with_payload(
            RawType::from_parts(DATA_MAJOR, 0),
            i,
            MessageFlags::ACK_REQUESTED,
            payload.as_bytes(),
        )?;
        alice.push_outgoing(1, 0, vec![message])?;
    }
    println!("alice queued {count} reliable message(s)");

    while alice.outgoing_len() > 0 || bob.outgoing_len() > 0 {
        let now = Instant::now();
        alice.update(now, RESOLUTION, &mut alice_link)?;
        bob.update(now, RESOLUTION, &mut bob_link)?;

        for frame in to_bob_rx.try_iter() {
            bob.process_raw_data(1, 0, &frame, &mut bob_app)?;
        }
        for frame in to_alice_rx.try_iter() {
            alice.process_raw_data(1, 0, &frame, &mut alice_app)?;
        }

        thread::sleep(RESOLUTION);
    }

    println!("all messages acknowledged");
    Ok(())
}
