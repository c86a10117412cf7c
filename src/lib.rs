//! Tick-driven finite state machines for a debounced push-button and a
//! humidity/temperature telemetry sequencer.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! simulator. Hardware is reached only through `embedded-hal` traits and
//! the port traits in [`app::ports`].

#![deny(unused_must_use)]

#[cfg(feature = "sim")]
pub mod adapters;
pub mod app;
pub mod blink;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod modem;
pub mod sensors;
pub mod tick;

pub use error::{ConfigError, Error, SensorError, TickError};
