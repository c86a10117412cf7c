//! System configuration parameters
//!
//! All tunable timing and endpoint parameters for the tick-driven FSMs.
//! Defaults match the reference board: a 16 ms debounce tick over a
//! 3-sample window, a 1 s telemetry tick with a 255-tick cycle, and a
//! DHT12 humidity/temperature sensor at 0x5C.
//!
//! Every FSM constructor calls [`SystemConfig::validate`] (or the section
//! validator it needs) before the first tick is delivered.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::modem;
use crate::sensors::dht12::Reading;

/// Width of the debounce sample shift register in bits.
pub const SAMPLE_REGISTER_BITS: u8 = 8;

/// Serialized config blobs never exceed this many bytes.
pub const CONFIG_BLOB_MAX: usize = 256;

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Number of identical consecutive samples required to settle (N).
    pub width: u8,
    /// Fast tick period (milliseconds).
    pub tick_period_ms: u16,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            width: 3,
            tick_period_ms: 16,
        }
    }
}

impl DebounceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 1 {
            return Err(ConfigError::DebounceWidthTooSmall(self.width));
        }
        if self.width > SAMPLE_REGISTER_BITS {
            return Err(ConfigError::DebounceWidthTooLarge(self.width));
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod("debounce"));
        }
        Ok(())
    }

    /// Bit mask selecting the newest `width` samples.
    pub fn mask(&self) -> u8 {
        if self.width >= SAMPLE_REGISTER_BITS {
            u8::MAX
        } else {
            (1u8 << self.width) - 1
        }
    }

    /// Time from the last contact bounce to a confirmed level: N × tick.
    pub fn latency_ms(&self) -> u32 {
        self.width as u32 * self.tick_period_ms as u32
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Ticks per measure-and-transmit cycle. Must exceed 4.
    pub cycle_length: u16,
    /// Slow tick period (milliseconds).
    pub tick_period_ms: u32,
    /// Minimum settling time the modem needs between two commands.
    pub min_command_spacing_ms: u32,
    /// Two-wire address of the humidity/temperature sensor.
    pub sensor_address: u8,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            cycle_length: 255,
            tick_period_ms: 1000,
            min_command_spacing_ms: 500,
            sensor_address: 0x5c,
        }
    }
}

impl SequencerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_length <= 4 {
            return Err(ConfigError::CycleTooShort(self.cycle_length));
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod("sequencer"));
        }
        if self.tick_period_ms < self.min_command_spacing_ms {
            return Err(ConfigError::CommandSpacing {
                tick_ms: self.tick_period_ms,
                min_ms: self.min_command_spacing_ms,
            });
        }
        Ok(())
    }

    /// Wall-clock length of one full cycle.
    pub fn cycle_ms(&self) -> u64 {
        self.cycle_length as u64 * self.tick_period_ms as u64
    }
}

// ---------------------------------------------------------------------------
// Modem / collector endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModemConfig {
    /// Network the modem joins during bring-up.
    pub ssid: String<32>,
    pub passphrase: String<32>,
    /// Collector host and TCP port.
    pub host: String<32>,
    pub port: u16,
    /// Request path on the collector.
    pub path: String<16>,
    /// Write key appended to every request.
    pub api_key: String<24>,
    /// Query field carrying humidity.
    pub humidity_field: String<12>,
    /// Query field carrying temperature.
    pub temperature_field: String<12>,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            ssid: fixed("sensor-net"),
            passphrase: fixed("changeme"),
            host: fixed("api.thingspeak.com"),
            port: 80,
            path: fixed("/update"),
            api_key: fixed("0000000000000000"),
            humidity_field: fixed("field1"),
            temperature_field: fixed("field2"),
        }
    }
}

impl ModemConfig {
    /// Rejects endpoints whose worst-case request would overflow a line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let widest = Reading {
            humidity_integer: u8::MAX,
            humidity_decimal: u8::MAX,
            temperature_integer: u8::MAX,
            temperature_decimal: u8::MAX,
        };
        modem::format_request(self, &widest).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Press blinker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkConfig {
    /// Blink tick period (milliseconds).
    pub tick_period_ms: u16,
    /// Ticks after the last press before pending toggles are shown.
    pub hold_off_ticks: u8,
    /// LED toggles queued per confirmed press (2 = one full blink).
    pub toggles_per_press: u8,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 262,
            hold_off_ticks: 8,
            toggles_per_press: 2,
        }
    }
}

impl BlinkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod("blink"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SystemConfig
// ---------------------------------------------------------------------------

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub debounce: DebounceConfig,
    pub sequencer: SequencerConfig,
    pub modem: ModemConfig,
    pub blink: BlinkConfig,
}

impl SystemConfig {
    /// Validate every section. Called once at startup; a failure here is
    /// the only fatal condition in the system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.debounce.validate()?;
        self.sequencer.validate()?;
        self.modem.validate()?;
        self.blink.validate()
    }

    /// Serialize into `buf` for non-volatile storage.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Corrupted)
    }

    /// Decode a stored blob. The result is validated before it is returned.
    pub fn decode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}

fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    // Defaults are compile-time literals sized to fit.
    let _ = out.push_str(s);
    out
}
