//! Mock peripherals for integration tests.
//!
//! Records every bus and transport call so tests can assert on the full
//! interaction history without touching real pins or UARTs.

use std::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use tickfsm::app::ports::{Direction, LineTransport, TwoWire};
use tickfsm::sensors::dht12::Reading;
use tickfsm::SensorError;

// ── Bus call record ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BusCall {
    Begin { address: u8, direction: Direction },
    Write(u8),
    ReadAck,
    ReadNack,
    End,
}

// ── MockBus ───────────────────────────────────────────────────

/// DHT12 stand-in whose presence and register contents tests control.
pub struct MockBus {
    pub present: bool,
    pub registers: [u8; 4],
    pub calls: Vec<BusCall>,
    cursor: usize,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new(reading: Reading) -> Self {
        let mut bus = Self {
            present: true,
            registers: [0; 4],
            calls: Vec::new(),
            cursor: 0,
        };
        bus.set_reading(reading);
        bus
    }

    pub fn set_reading(&mut self, r: Reading) {
        self.registers = [
            r.humidity_integer,
            r.humidity_decimal,
            r.temperature_integer,
            r.temperature_decimal,
        ];
    }

    /// Every `Begin` must be matched by an `End`.
    pub fn balanced(&self) -> bool {
        let begins = self.calls.iter().filter(|c| matches!(c, BusCall::Begin { .. })).count();
        let ends = self.calls.iter().filter(|c| **c == BusCall::End).count();
        begins == ends
    }

    fn next(&mut self) -> u8 {
        let b = self.registers[self.cursor % 4];
        self.cursor += 1;
        b
    }
}

impl TwoWire for MockBus {
    fn begin_transaction(&mut self, address: u8, direction: Direction) -> Result<(), SensorError> {
        self.calls.push(BusCall::Begin { address, direction });
        if self.present {
            Ok(())
        } else {
            Err(SensorError::NotResponding(address))
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.cursor = byte as usize;
        self.calls.push(BusCall::Write(byte));
    }

    fn read_byte_ack(&mut self) -> u8 {
        self.calls.push(BusCall::ReadAck);
        self.next()
    }

    fn read_byte_nack(&mut self) -> u8 {
        self.calls.push(BusCall::ReadNack);
        self.next()
    }

    fn end_transaction(&mut self) {
        self.calls.push(BusCall::End);
    }
}

// ── RecordingTransport ────────────────────────────────────────

#[derive(Default)]
pub struct RecordingTransport {
    pub lines: Vec<String>,
}

impl LineTransport for RecordingTransport {
    fn send_line(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }
}

// ── MockButton ────────────────────────────────────────────────

/// Input whose level the test sets directly; idles released (high).
pub struct MockButton {
    pub high: bool,
    pub reads: u32,
}

impl MockButton {
    pub fn new() -> Self {
        Self { high: true, reads: 0 }
    }
}

impl ErrorType for MockButton {
    type Error = Infallible;
}

impl InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        self.reads += 1;
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.reads += 1;
        Ok(!self.high)
    }
}

// ── MockLed ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLed {
    pub high: bool,
    pub toggles: u32,
}

impl ErrorType for MockLed {
    type Error = Infallible;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.toggles += u32::from(self.high);
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.toggles += u32::from(!self.high);
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for MockLed {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}
