//! Sensor drivers.

pub mod dht12;
