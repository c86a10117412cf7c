//! Host-side simulation of the board peripherals.
//!
//! Time is driven explicitly by the caller: [`ScriptedButton::set_time`]
//! moves the button's clock, and the other proxies react per call.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use log::{debug, info};

use crate::app::ports::{Direction, LineTransport, TwoWire};
use crate::error::SensorError;
use crate::sensors::dht12::DHT12_ADDRESS;

// ───────────────────────────────────────────────────────────────
// Push-button
// ───────────────────────────────────────────────────────────────

/// One scripted press: contact at `at_ms`, released `hold_ms` later.
#[derive(Debug, Clone, Copy)]
pub struct Press {
    pub at_ms: u32,
    pub hold_ms: u32,
}

/// Active-low push-button whose contacts chatter for `bounce_ms` after
/// every make and break.
pub struct ScriptedButton {
    presses: Vec<Press>,
    bounce_ms: u32,
    now_ms: u32,
}

impl ScriptedButton {
    pub fn new(presses: Vec<Press>, bounce_ms: u32) -> Self {
        Self {
            presses,
            bounce_ms,
            now_ms: 0,
        }
    }

    pub fn set_time(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
    }

    /// Electrical level at the current time (`true` = high, released).
    pub fn level(&self) -> bool {
        let now = self.now_ms;
        for p in &self.presses {
            let release = p.at_ms + p.hold_ms;
            if now >= p.at_ms && now < p.at_ms + self.bounce_ms {
                return (now - p.at_ms) % 2 == 1;
            }
            if now >= release && now < release + self.bounce_ms {
                return (now - release) % 2 == 0;
            }
            if now >= p.at_ms && now < release {
                return false;
            }
        }
        true
    }
}

impl ErrorType for ScriptedButton {
    type Error = Infallible;
}

impl InputPin for ScriptedButton {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

// ───────────────────────────────────────────────────────────────
// DHT12
// ───────────────────────────────────────────────────────────────

/// DHT12 answering at its default address with slowly drifting values.
///
/// With `fail_every = Some(n)`, every n-th measurement is not
/// acknowledged.
pub struct SimDht12 {
    registers: [u8; 4],
    pointer: usize,
    reads: u32,
    fail_every: Option<u32>,
}

impl SimDht12 {
    pub fn new(fail_every: Option<u32>) -> Self {
        Self {
            registers: [45, 0, 21, 5],
            pointer: 0,
            reads: 0,
            fail_every,
        }
    }

    fn drift(&mut self) {
        self.registers[1] = (self.registers[1] + 3) % 10;
        self.registers[3] = (self.registers[3] + 1) % 10;
        if self.registers[3] == 0 {
            self.registers[2] = self.registers[2].wrapping_add(1);
        }
    }

    fn next(&mut self) -> u8 {
        let b = self.registers[self.pointer % 4];
        self.pointer += 1;
        b
    }
}

impl TwoWire for SimDht12 {
    fn begin_transaction(&mut self, address: u8, direction: Direction) -> Result<(), SensorError> {
        if address != DHT12_ADDRESS {
            return Err(SensorError::NotResponding(address));
        }
        if direction == Direction::Write {
            self.reads += 1;
            if self.fail_every.is_some_and(|n| n > 0 && self.reads % n == 0) {
                return Err(SensorError::NotResponding(address));
            }
            self.drift();
        }
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) {
        self.pointer = byte as usize;
    }

    fn read_byte_ack(&mut self) -> u8 {
        self.next()
    }

    fn read_byte_nack(&mut self) -> u8 {
        self.next()
    }

    fn end_transaction(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Modem
// ───────────────────────────────────────────────────────────────

/// Modem transport that logs every line instead of transmitting it.
#[derive(Default)]
pub struct LogTransport {
    lines: u32,
    bytes: usize,
}

impl LogTransport {
    pub fn lines(&self) -> u32 {
        self.lines
    }

    /// Bytes sent, terminators included.
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl LineTransport for LogTransport {
    fn send_line(&mut self, text: &str) {
        self.lines += 1;
        self.bytes += crate::modem::wire_len(text);
        info!("modem <- {}", text);
    }
}

// ───────────────────────────────────────────────────────────────
// LED
// ───────────────────────────────────────────────────────────────

pub struct SimLed {
    name: &'static str,
    high: bool,
    toggles: u32,
}

impl SimLed {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            high: false,
            toggles: 0,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.high
    }

    /// Level changes since construction.
    pub fn toggles(&self) -> u32 {
        self.toggles
    }

    fn drive(&mut self, high: bool) {
        if high != self.high {
            self.toggles += 1;
            debug!("{}: {}", self.name, if high { "on" } else { "off" });
        }
        self.high = high;
    }
}

impl ErrorType for SimLed {
    type Error = Infallible;
}

impl OutputPin for SimLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

impl StatefulOutputPin for SimLed {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}
