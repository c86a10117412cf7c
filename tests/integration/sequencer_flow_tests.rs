//! Integration tests for the slow-tick sequencer against mock bus and
//! modem transport.

use tickfsm::app::ports::Direction;
use tickfsm::config::{ModemConfig, SequencerConfig};
use tickfsm::fsm::sequencer::{Sequencer, SequencerState};
use tickfsm::modem;
use tickfsm::sensors::dht12::{DHT12_ADDRESS, Reading};

use crate::mock_hw::{BusCall, MockBus, RecordingTransport};

const FIRST: Reading = Reading {
    humidity_integer: 48,
    humidity_decimal: 2,
    temperature_integer: 22,
    temperature_decimal: 9,
};

fn make(cycle_length: u16) -> Sequencer<MockBus, RecordingTransport> {
    let config = SequencerConfig {
        cycle_length,
        ..SequencerConfig::default()
    };
    Sequencer::new(
        &config,
        &ModemConfig::default(),
        MockBus::new(FIRST),
        RecordingTransport::default(),
    )
    .unwrap()
}

// ── One cycle of length 8 ─────────────────────────────────────

#[test]
fn cycle_of_eight_runs_active_states_then_idles() {
    let mut seq = make(8);
    let mut trace = Vec::new();
    for _ in 0..8 {
        seq.tick();
        trace.push((seq.state(), seq.phase()));
    }

    use SequencerState::*;
    assert_eq!(
        trace,
        vec![
            (ReadSensor, 1),
            (SessionStart, 2),
            (AnnounceLength, 3),
            (SendPayload, 4),
            (Idle, 5),
            (Idle, 6),
            (Idle, 7),
            (Idle, 0),
        ]
    );
    assert_eq!(seq.cycles(), 1);
}

#[test]
fn transmits_announced_request() {
    let mut seq = make(8);
    for _ in 0..8 {
        seq.tick();
    }

    let lines = &seq.transport().lines;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "AT+CIPSTART=\"TCP\",\"api.thingspeak.com\",80");
    assert_eq!(
        lines[2],
        "GET /update?api_key=0000000000000000&field1=48.2&field2=22.9"
    );
    assert_eq!(lines[1], format!("AT+CIPSEND={}", modem::wire_len(&lines[2])));
}

#[test]
fn sensor_read_is_one_bus_exchange() {
    let mut seq = make(8);
    seq.tick();

    assert_eq!(
        seq.bus().calls,
        vec![
            BusCall::Begin { address: DHT12_ADDRESS, direction: Direction::Write },
            BusCall::Write(0x00),
            BusCall::End,
            BusCall::Begin { address: DHT12_ADDRESS, direction: Direction::Read },
            BusCall::ReadAck,
            BusCall::ReadAck,
            BusCall::ReadAck,
            BusCall::ReadNack,
            BusCall::End,
        ]
    );
    assert!(seq.transport().lines.is_empty());
}

// ── Sensor failure keeps the previous payload ─────────────────

#[test]
fn failed_read_resends_previous_values() {
    let mut seq = make(8);
    for _ in 0..8 {
        seq.tick();
    }

    seq.bus_mut().present = false;
    seq.bus_mut().set_reading(Reading {
        humidity_integer: 90,
        ..FIRST
    });
    seq.bus_mut().calls.clear();

    assert_eq!(seq.tick(), Some(SequencerState::ReadSensor));
    assert_eq!(seq.bus().calls.len(), 2, "failed begin still issues STOP");
    assert!(seq.bus().balanced());

    assert_eq!(seq.tick(), Some(SequencerState::SessionStart));
    seq.tick();
    seq.tick();

    assert_eq!(seq.sensor_failures(), 1);
    assert_eq!(seq.payload(), FIRST);
    let lines = &seq.transport().lines;
    assert_eq!(lines[lines.len() - 1], lines[2], "same request as last cycle");
}

#[test]
fn recovered_sensor_updates_next_cycle() {
    let mut seq = make(6);
    seq.bus_mut().present = false;
    for _ in 0..6 {
        seq.tick();
    }
    assert_eq!(seq.payload(), Reading::default());

    seq.bus_mut().present = true;
    for _ in 0..6 {
        seq.tick();
    }
    assert_eq!(seq.payload(), FIRST);
    assert_eq!(seq.sensor_failures(), 1);
    assert_eq!(seq.cycles(), 2);
}

// ── Bring-up precedes the first cycle ─────────────────────────

#[test]
fn bring_up_then_cycle_on_same_transport() {
    let mut transport = RecordingTransport::default();
    modem::bring_up(&mut transport, &ModemConfig::default()).unwrap();

    let mut seq = Sequencer::new(
        &SequencerConfig::default(),
        &ModemConfig::default(),
        MockBus::new(FIRST),
        transport,
    )
    .unwrap();
    for _ in 0..4 {
        seq.tick();
    }

    let lines = &seq.transport().lines;
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "AT");
    assert!(lines[3].starts_with("AT+CIPSTART="));
}
