//! Port traits: the boundary between the FSMs and the peripherals they
//! drive.
//!
//! ```text
//!   Peripheral proxy ──▶ Port trait ──▶ FSM state handler
//! ```
//!
//! Every operation is synchronous and bounded; none of them may block for
//! longer than a tick. Byte-level bus timing and UART buffering live
//! behind these traits.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Digital input
// ───────────────────────────────────────────────────────────────

/// Read the raw level of a digital input.
///
/// A pin read error is reported as high, the idle level of a pulled-up
/// switch, so a flaky read can never confirm a press.
pub fn read_level<P: InputPin>(pin: &mut P) -> bool {
    match pin.is_high() {
        Ok(level) => level,
        Err(e) => {
            warn!("input read failed: {:?}", e);
            true
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Two-wire bus
// ───────────────────────────────────────────────────────────────

/// Direction bit appended to the slave address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Write,
    Read,
}

impl Direction {
    /// Address byte as sent on the wire: `(address << 1) | r/w`.
    pub fn address_byte(self, address: u8) -> u8 {
        (address << 1) | u8::from(self == Self::Read)
    }
}

/// Byte-level two-wire client.
///
/// `end_transaction` must be called after every `begin_transaction`,
/// including a failed one, to release the bus.
pub trait TwoWire {
    /// Issue START and the address byte. Fails if the slave does not ACK.
    fn begin_transaction(&mut self, address: u8, direction: Direction) -> Result<(), SensorError>;

    fn write_byte(&mut self, byte: u8);

    /// Read one byte and ACK it (more bytes follow).
    fn read_byte_ack(&mut self) -> u8;

    /// Read one byte and NACK it (last byte of the transfer).
    fn read_byte_nack(&mut self) -> u8;

    /// Issue STOP.
    fn end_transaction(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Line transport
// ───────────────────────────────────────────────────────────────

/// Line-oriented serial transport to the modem.
///
/// Implementations append [`LINE_TERMINATOR`](crate::modem::LINE_TERMINATOR)
/// to every line they send.
pub trait LineTransport {
    fn send_line(&mut self, text: &str);
}
