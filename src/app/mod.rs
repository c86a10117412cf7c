//! Application core: event dispatch over the tick-driven machines.
//!
//! All interaction with hardware happens through the **port traits**
//! defined in [`ports`], keeping this layer testable without real
//! peripherals.

pub mod ports;
pub mod service;
