//! DHT12 humidity/temperature sensor over the two-wire bus.
//!
//! The sensor exposes its measurement as four consecutive registers
//! starting at 0x00: humidity integer, humidity decimal, temperature
//! integer, temperature decimal. One read is a register-pointer write
//! followed by a four-byte burst, the last byte NACKed.

use core::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::{Direction, TwoWire};
use crate::error::SensorError;

/// Default bus address.
pub const DHT12_ADDRESS: u8 = 0x5c;

/// First measurement register.
const REG_HUMIDITY_INTEGER: u8 = 0x00;

/// One humidity/temperature measurement, exactly as the sensor reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub humidity_integer: u8,
    pub humidity_decimal: u8,
    pub temperature_integer: u8,
    pub temperature_decimal: u8,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RH {}.{} % / T {}.{} C",
            self.humidity_integer,
            self.humidity_decimal,
            self.temperature_integer,
            self.temperature_decimal
        )
    }
}

/// Read all four measurement registers.
///
/// Every transaction is closed with STOP even when the address is not
/// acknowledged.
pub fn read<B: TwoWire>(bus: &mut B, address: u8) -> Result<Reading, SensorError> {
    let started = bus.begin_transaction(address, Direction::Write);
    if let Err(e) = started {
        bus.end_transaction();
        warn!("dht12: {}", e);
        return Err(e);
    }
    bus.write_byte(REG_HUMIDITY_INTEGER);
    bus.end_transaction();

    let started = bus.begin_transaction(address, Direction::Read);
    if let Err(e) = started {
        bus.end_transaction();
        warn!("dht12: {} on read phase", e);
        return Err(e);
    }
    let reading = Reading {
        humidity_integer: bus.read_byte_ack(),
        humidity_decimal: bus.read_byte_ack(),
        temperature_integer: bus.read_byte_ack(),
        temperature_decimal: bus.read_byte_nack(),
    };
    bus.end_transaction();

    Ok(reading)
}
