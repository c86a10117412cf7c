//! Unified error types for the tick-driven FSM core.
//!
//! A single `Error` enum that every subsystem converts into. All variants
//! are `Copy` so they can be handed out of tick context without allocation.
//! Only configuration errors are fatal; peripheral errors are handled
//! inside the state that triggered them.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration rejected at initialisation.
    Config(ConfigError),
    /// A peripheral behind a proxy did not respond.
    Sensor(SensorError),
    /// Tick delivery could not be serviced.
    Tick(TickError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Tick(e) => write!(f, "tick: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Debounce width must be at least 2 samples.
    DebounceWidthTooSmall(u8),
    /// Debounce width exceeds the sample register.
    DebounceWidthTooLarge(u8),
    /// Cycle length must leave room for the four active phases.
    CycleTooShort(u16),
    /// A tick period of zero would never advance.
    ZeroTickPeriod(&'static str),
    /// Slow tick is shorter than the modem's minimum command spacing.
    CommandSpacing { tick_ms: u32, min_ms: u32 },
    /// The formatted request would not fit in a transport line.
    PayloadTooLong,
    /// A state table row is out of order or malformed.
    StateTable(&'static str),
    /// A stored configuration blob could not be decoded.
    Corrupted,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DebounceWidthTooSmall(n) => {
                write!(f, "debounce width {n} too small (minimum 2 samples)")
            }
            Self::DebounceWidthTooLarge(n) => {
                write!(f, "debounce width {n} exceeds the 8-bit sample register")
            }
            Self::CycleTooShort(n) => {
                write!(f, "cycle length {n} ticks too short (must exceed 4)")
            }
            Self::ZeroTickPeriod(which) => write!(f, "{which} tick period is zero"),
            Self::CommandSpacing { tick_ms, min_ms } => {
                write!(f, "slow tick {tick_ms} ms below minimum command spacing {min_ms} ms")
            }
            Self::PayloadTooLong => write!(f, "request template exceeds line buffer"),
            Self::StateTable(msg) => write!(f, "state table: {msg}"),
            Self::Corrupted => write!(f, "stored config could not be decoded"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Slave address was not acknowledged.
    NotResponding(u8),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotResponding(addr) => write!(f, "device 0x{addr:02x} not responding"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Tick errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickError {
    /// A tick arrived while the previous update was still running.
    Reentrant,
    /// The tick target has not been installed yet.
    Uninstalled,
    /// The event queue was full and the tick was dropped.
    QueueFull,
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reentrant => write!(f, "re-entrant tick rejected"),
            Self::Uninstalled => write!(f, "no FSM installed"),
            Self::QueueFull => write!(f, "event queue full"),
        }
    }
}

impl From<TickError> for Error {
    fn from(e: TickError) -> Self {
        Self::Tick(e)
    }
}
