//! Press-count blinker.
//!
//! Every confirmed press queues a fixed number of LED toggles and restarts
//! a hold-off. Once the hold-off has run out on the slow blink tick, one
//! queued toggle is played per tick, so the LED blinks back the number of
//! presses after the user stops pressing.

use embedded_hal::digital::StatefulOutputPin;
use log::{debug, warn};

use crate::config::BlinkConfig;
use crate::error::ConfigError;

pub struct PressBlinker<P> {
    led: P,
    pending: u16,
    since_press: u8,
    hold_off_ticks: u8,
    toggles_per_press: u8,
}

impl<P: StatefulOutputPin> PressBlinker<P> {
    pub fn new(config: &BlinkConfig, led: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            led,
            pending: 0,
            since_press: 0,
            hold_off_ticks: config.hold_off_ticks,
            toggles_per_press: config.toggles_per_press,
        })
    }

    /// Queue the toggles for one confirmed press and restart the hold-off.
    pub fn on_press(&mut self) {
        self.pending = self.pending.saturating_add(u16::from(self.toggles_per_press));
        self.since_press = 0;
        debug!("blink: {} toggles pending", self.pending);
    }

    /// Advance one blink tick. Returns `true` if the LED was toggled.
    pub fn tick(&mut self) -> bool {
        self.since_press = self.since_press.saturating_add(1);
        if self.since_press < self.hold_off_ticks || self.pending == 0 {
            return false;
        }
        if let Err(e) = self.led.toggle() {
            warn!("blink: toggle failed: {:?}", e);
            return false;
        }
        self.pending -= 1;
        true
    }

    pub fn pending(&self) -> u16 {
        self.pending
    }

    pub fn led(&self) -> &P {
        &self.led
    }
}
