//! Integration tests for the wirepack-transport crate.
//!
//! These exercise the full manager behavior: framing, split-delivery
//! reassembly, acknowledgement matching, resend scheduling and purging.

use std::time::{Duration, Instant};

use wirepack_core::{config::Config, error::ErrorKind};
use wirepack_protocol::{
    message::{ChannelId, ConnectionId, Message, MessageFlags, RawType},
    wire_codec::{decoder, TransmissionEncoder},
};
use wirepack_transport::{LinkRecipient, LinkSink, Transmission, TransportManager};

const DATA_MAJOR: u16 = 1;
const RESOLUTION: Duration = Duration::from_millis(16);

fn create_manager() -> TransportManager {
    create_manager_with(&Config::default())
}

fn create_manager_with(config: &Config) -> TransportManager {
    let mut manager = TransportManager::new(config);
    manager.register_decoder(DATA_MAJOR, decoder::decode_payload_message);
    manager
}

fn data_message(packet_id: u32, flags: MessageFlags, payload: &[u8]) -> Message {
    Message::with_payload(RawType::from_parts(DATA_MAJOR, 0), packet_id, flags, payload).unwrap()
}

/// Collects every frame offered for sending.
struct FrameLog {
    frames: Vec<(ConnectionId, ChannelId, Vec<u8>)>,
    confirm: bool,
}

impl FrameLog {
    fn new() -> Self {
        Self { frames: Vec::new(), confirm: false }
    }
}

impl LinkSink for FrameLog {
    fn transmit(&mut self, connection: ConnectionId, channel: ChannelId, frame: &[u8]) -> bool {
        self.frames.push((connection, channel, frame.to_vec()));
        self.confirm
    }
}

/// Collects every delivered transmission.
struct Inbox {
    received: Vec<Transmission>,
    accept: bool,
}

impl Inbox {
    fn new() -> Self {
        Self { received: Vec::new(), accept: true }
    }
}

impl LinkRecipient for Inbox {
    fn deliver(&mut self, transmission: Transmission) -> bool {
        self.received.push(transmission);
        self.accept
    }
}

#[test]
fn round_trip_in_one_delivery() {
    let mut manager = create_manager();
    let mut inbox = Inbox::new();

    let messages = vec![
        data_message(1, MessageFlags::empty(), b"alpha"),
        data_message(2, MessageFlags::empty(), b"beta"),
    ];
    let frame = manager.serialize_transmission(&messages).unwrap();

    let report = manager.process_raw_data(7, 3, &frame, &mut inbox).unwrap();
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.buffered, 0);

    assert_eq!(inbox.received.len(), 1);
    let delivered = &inbox.received[0];
    assert_eq!(delivered.connection, 7);
    assert_eq!(delivered.channel, 3);
    assert_eq!(delivered.messages, messages);
}

#[test]
fn fragmentation_is_equivalent_at_every_split_offset() {
    let reference = {
        let mut manager = create_manager();
        let mut inbox = Inbox::new();
        let frame = manager
            .serialize_transmission(&[data_message(5, MessageFlags::empty(), &[0xC3; 32])])
            .unwrap();
        manager.process_raw_data(1, 0, &frame, &mut inbox).unwrap();
        inbox.received.remove(0).messages
    };

    let template = create_manager()
        .serialize_transmission(&[data_message(5, MessageFlags::empty(), &[0xC3; 32])])
        .unwrap();

    // The opening chunk must carry the whole header; every later byte is a
    // valid split point.
    for split in 8..template.len() {
        let mut manager = create_manager();
        let mut inbox = Inbox::new();

        let first = manager.process_raw_data(1, 0, &template[..split], &mut inbox).unwrap();
        assert_eq!(first.buffered, 1, "split at {split} should buffer");
        assert!(inbox.received.is_empty());

        let second = manager.process_raw_data(1, 0, &template[split..], &mut inbox).unwrap();
        assert_eq!(second.dispatched, 1, "split at {split} should complete");
        assert_eq!(manager.reassembling_len(), 0);

        assert_eq!(inbox.received.len(), 1);
        assert_eq!(inbox.received[0].messages, reference, "split at {split}");
    }
}

#[test]
fn ack_lifecycle_retires_the_entry() {
    let mut manager = create_manager();
    let mut sink = FrameLog::new();
    let now = Instant::now();

    let ack_id = manager
        .push_outgoing(1, 0, vec![data_message(10, MessageFlags::ACK_REQUESTED, b"reliable")])
        .unwrap()
        .expect("ack id assigned");

    // First update sends but keeps the entry pending.
    assert_eq!(manager.update(now, RESOLUTION, &mut sink).unwrap(), 1);
    assert_eq!(manager.outgoing_len(), 1);

    // Acknowledgement arrives: the entry is gone.
    let ack_frame = TransmissionEncoder::encode_transmission(&[Message::ack(ack_id)]).unwrap();
    let mut inbox = Inbox::new();
    let report = manager.process_raw_data(1, 0, &ack_frame, &mut inbox).unwrap();
    assert_eq!(report.acks_matched, 1);
    assert_eq!(manager.outgoing_len(), 0);
    assert!(inbox.received.is_empty());

    // Nothing left to resend.
    let later = now + RESOLUTION * 100;
    assert_eq!(manager.update(later, RESOLUTION, &mut sink).unwrap(), 0);
}

#[test]
fn resend_waits_for_the_full_backoff() {
    let mut manager = create_manager();
    let mut sink = FrameLog::new();
    let now = Instant::now();

    manager
        .push_outgoing(1, 0, vec![data_message(1, MessageFlags::ACK_REQUESTED, b"x")])
        .unwrap();

    assert_eq!(manager.update(now, RESOLUTION, &mut sink).unwrap(), 1);
    // Default resend frequency is 3 resolution ticks.
    assert_eq!(manager.update(now + RESOLUTION, RESOLUTION, &mut sink).unwrap(), 0);
    assert_eq!(manager.update(now + RESOLUTION * 2, RESOLUTION, &mut sink).unwrap(), 0);
    assert_eq!(manager.update(now + RESOLUTION * 3, RESOLUTION, &mut sink).unwrap(), 1);
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.frames[0].2, sink.frames[1].2, "resend offers the same frame");
}

#[test]
fn sink_confirmation_retires_reliable_entries() {
    let mut manager = create_manager();
    let mut sink = FrameLog::new();
    sink.confirm = true;

    manager
        .push_outgoing(1, 0, vec![data_message(1, MessageFlags::ACK_REQUESTED, b"x")])
        .unwrap();

    assert_eq!(manager.update(Instant::now(), RESOLUTION, &mut sink).unwrap(), 1);
    assert_eq!(manager.outgoing_len(), 0);
}

#[test]
fn unreliable_entries_are_sent_exactly_once() {
    let mut manager = create_manager();
    let mut sink = FrameLog::new();
    let now = Instant::now();

    manager.push_outgoing(1, 0, vec![data_message(1, MessageFlags::empty(), b"x")]).unwrap();

    assert_eq!(manager.update(now, RESOLUTION, &mut sink).unwrap(), 1);
    assert_eq!(manager.outgoing_len(), 0);
    assert_eq!(manager.update(now + RESOLUTION * 10, RESOLUTION, &mut sink).unwrap(), 0);
}

#[test]
fn capacity_boundary_rejects_the_extra_push() {
    let mut manager = create_manager();
    for i in 0..1024u32 {
        manager
            .push_outgoing(1, 0, vec![data_message(i, MessageFlags::empty(), b"")])
            .unwrap();
    }

    let err = manager
        .push_outgoing(1, 0, vec![data_message(9999, MessageFlags::empty(), b"")])
        .unwrap_err();
    assert_eq!(err, ErrorKind::OutgoingTableFull(1024));
    assert_eq!(manager.outgoing_len(), 1024);
}

#[test]
fn purge_removes_only_the_disconnected_connection() {
    let mut manager = create_manager();
    let (a, b, c) = (1, 2, 3);
    for connection in [a, b, c] {
        manager
            .push_outgoing(connection, 0, vec![data_message(connection, MessageFlags::empty(), b"")])
            .unwrap();
    }

    manager.purge_connection(c);
    assert_eq!(manager.outgoing_len(), 2);

    let mut sink = FrameLog::new();
    manager.update(Instant::now(), RESOLUTION, &mut sink).unwrap();
    let mut sent: Vec<ConnectionId> = sink.frames.iter().map(|(conn, _, _)| *conn).collect();
    sent.sort_unstable();
    assert_eq!(sent, vec![a, b]);
}

#[test]
fn serialized_buffer_matches_the_documented_layout() {
    let mut manager = create_manager();
    let message = data_message(10, MessageFlags::ACK_REQUESTED, b"");
    manager.push_outgoing(1, 0, vec![message.clone()]).unwrap();

    let frame = manager.serialize_transmission(&[message]).unwrap();
    assert_eq!(&frame[..4], &0x4C57_504Bu32.to_be_bytes());
    assert_eq!(&frame[4..8], &(frame.len() as u32).to_be_bytes());

    let decoded = manager.decode_transmission(1, 0, &frame).unwrap();
    assert_eq!(decoded.messages.len(), 1);
    assert_eq!(decoded.messages[0].raw_type().major(), 1);
    assert_eq!(decoded.messages[0].packet_id(), 10);
    assert!(decoded.messages[0].flags().contains(MessageFlags::ACK_REQUESTED));
}

#[test]
fn one_delivery_may_carry_back_to_back_transmissions() {
    let mut manager = create_manager();
    let mut inbox = Inbox::new();

    let mut wire = manager
        .serialize_transmission(&[data_message(1, MessageFlags::empty(), b"first")])
        .unwrap();
    wire.extend(
        manager
            .serialize_transmission(&[data_message(2, MessageFlags::empty(), b"second")])
            .unwrap(),
    );

    let report = manager.process_raw_data(1, 0, &wire, &mut inbox).unwrap();
    assert_eq!(report.dispatched, 2);
    assert_eq!(inbox.received.len(), 2);
    assert_eq!(inbox.received[0].messages[0].packet_id(), 1);
    assert_eq!(inbox.received[1].messages[0].packet_id(), 2);
}

#[test]
fn trailing_bytes_after_a_transmission_continue_a_split_one() {
    let mut manager = create_manager();
    let mut inbox = Inbox::new();

    let split_frame = manager
        .serialize_transmission(&[data_message(1, MessageFlags::empty(), &[0xEE; 40])])
        .unwrap();
    let whole_frame = manager
        .serialize_transmission(&[data_message(2, MessageFlags::empty(), b"whole")])
        .unwrap();

    // Delivery 1: the first half of a transmission.
    manager.process_raw_data(1, 0, &split_frame[..25], &mut inbox).unwrap();
    // Delivery 2: a complete transmission... followed by the rest.
    let mut second = whole_frame;
    second.extend_from_slice(&split_frame[25..]);
    let report = manager.process_raw_data(1, 0, &second, &mut inbox).unwrap();

    assert_eq!(report.dispatched, 2);
    assert_eq!(inbox.received.len(), 2);
    assert_eq!(inbox.received[0].messages[0].packet_id(), 2);
    assert_eq!(inbox.received[1].messages[0].packet_id(), 1);
}

#[test]
fn declined_delivery_still_generates_the_ack() {
    let mut sender = create_manager();
    let mut receiver = create_manager();
    let mut inbox = Inbox::new();
    inbox.accept = false;

    let ack_id = sender
        .push_outgoing(2, 0, vec![data_message(1, MessageFlags::ACK_REQUESTED, b"payload")])
        .unwrap()
        .expect("ack id assigned");

    let mut sender_sink = FrameLog::new();
    sender.update(Instant::now(), RESOLUTION, &mut sender_sink).unwrap();
    let (_, _, frame) = sender_sink.frames.remove(0);

    receiver.process_raw_data(1, 0, &frame, &mut inbox).unwrap();
    assert_eq!(inbox.received.len(), 1, "declined deliveries still reach the recipient once");
    assert_eq!(receiver.outgoing_len(), 1, "ack queued despite the decline");

    let mut receiver_sink = FrameLog::new();
    receiver.update(Instant::now(), RESOLUTION, &mut receiver_sink).unwrap();
    let (_, _, ack_frame) = receiver_sink.frames.remove(0);

    let decoded = receiver.decode_transmission(1, 0, &ack_frame).unwrap();
    assert!(decoded.messages[0].is_ack());
    assert_eq!(decoded.messages[0].packet_id(), ack_id);
}

#[test]
fn two_managers_complete_a_reliable_exchange() {
    let mut alice = create_manager();
    let mut bob = create_manager();
    let now = Instant::now();

    alice
        .push_outgoing(2, 0, vec![data_message(77, MessageFlags::ACK_REQUESTED, b"hello bob")])
        .unwrap();

    // Alice sends; the frame reaches Bob.
    let mut alice_sink = FrameLog::new();
    alice.update(now, RESOLUTION, &mut alice_sink).unwrap();
    assert_eq!(alice.outgoing_len(), 1);

    let mut bob_inbox = Inbox::new();
    for (_, _, frame) in &alice_sink.frames {
        bob.process_raw_data(1, 0, frame, &mut bob_inbox).unwrap();
    }
    assert_eq!(bob_inbox.received.len(), 1);
    assert_eq!(bob_inbox.received[0].messages[0].payload(), b"hello bob");

    // Bob's ack flows back; Alice retires the entry and stops resending.
    let mut bob_sink = FrameLog::new();
    bob.update(now, RESOLUTION, &mut bob_sink).unwrap();
    let mut alice_inbox = Inbox::new();
    for (_, _, frame) in &bob_sink.frames {
        alice.process_raw_data(2, 0, frame, &mut alice_inbox).unwrap();
    }

    assert_eq!(alice.outgoing_len(), 0);
    let mut quiet = FrameLog::new();
    assert_eq!(alice.update(now + RESOLUTION * 10, RESOLUTION, &mut quiet).unwrap(), 0);
}

#[test]
fn arena_overflow_fails_the_ingest_call() {
    let config =
        Config { max_outgoing: 8, reassembly_capacity: 32, resend_frequency: 3 };
    let mut manager = create_manager_with(&config);
    let mut inbox = Inbox::new();

    let frame = manager
        .serialize_transmission(&[data_message(1, MessageFlags::empty(), &[0u8; 64])])
        .unwrap();
    assert!(frame.len() > 32);

    let err = manager.process_raw_data(1, 0, &frame[..20], &mut inbox).unwrap_err();
    assert!(matches!(err, ErrorKind::ReassemblyArenaFull { .. }));
    assert_eq!(manager.reassembling_len(), 0);
}

#[test]
fn split_inside_the_header_is_rejected() {
    let mut manager = create_manager();
    let mut inbox = Inbox::new();

    let frame = manager
        .serialize_transmission(&[data_message(1, MessageFlags::empty(), b"abc")])
        .unwrap();

    // Magic present but the length field is cut off.
    let err = manager.process_raw_data(1, 0, &frame[..6], &mut inbox).unwrap_err();
    assert!(matches!(err, ErrorKind::CouldNotReadHeader(_)));
}

#[test]
fn continuation_for_an_unknown_transmission_fails() {
    let mut manager = create_manager();
    let mut inbox = Inbox::new();

    let err = manager.process_raw_data(1, 0, &[0xAB, 0xCD, 0xEF], &mut inbox).unwrap_err();
    assert_eq!(err, ErrorKind::UnknownContinuation);
}

#[test]
fn unknown_major_type_delivers_the_decoded_prefix() {
    let mut manager = create_manager();
    let mut inbox = Inbox::new();

    let known = data_message(1, MessageFlags::empty(), b"keep");
    let unknown = Message::new(RawType::from_parts(99, 0), 2, MessageFlags::empty());
    let frame = TransmissionEncoder::encode_transmission(&[known.clone(), unknown]).unwrap();

    let report = manager.process_raw_data(1, 0, &frame, &mut inbox).unwrap();
    assert_eq!(report.truncated, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(inbox.received[0].messages, vec![known]);
}

#[test]
fn purge_drops_in_flight_reassembly() {
    let mut manager = create_manager();
    let mut inbox = Inbox::new();

    let frame = manager
        .serialize_transmission(&[data_message(1, MessageFlags::empty(), &[0u8; 40])])
        .unwrap();
    manager.process_raw_data(5, 0, &frame[..20], &mut inbox).unwrap();
    assert_eq!(manager.reassembling_len(), 1);

    manager.purge_connection(5);
    assert_eq!(manager.reassembling_len(), 0);

    // The tail of the purged transmission is now an unknown continuation.
    let err = manager.process_raw_data(5, 0, &frame[20..], &mut inbox).unwrap_err();
    assert_eq!(err, ErrorKind::UnknownContinuation);
}
