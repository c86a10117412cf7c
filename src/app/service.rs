//! Application service: the event-dispatching core.
//!
//! [`AppService`] owns the debounce FSM, the sequencer FSM and the press
//! blinker. The main loop drains the event queue and hands each event to
//! [`AppService::handle_event`] together with the peripherals the event
//! needs, so the service itself holds no hardware it does not own.
//!
//! ```text
//!  InputEdge ─────▶ enable debounce tick
//!  DebounceTick ──▶ Debouncer ──Pressed──▶ user action, PressBlinker
//!                             └─Released─▶ disable debounce tick
//!  SequencerTick ─▶ Sequencer ──▶ TwoWire / LineTransport
//!  BlinkTick ─────▶ PressBlinker ──▶ LED
//! ```

use embedded_hal::digital::{InputPin, StatefulOutputPin};
use log::{debug, info};

use crate::blink::PressBlinker;
use crate::config::SystemConfig;
use crate::error::ConfigError;
use crate::events::Event;
use crate::fsm::debounce::{DebounceEvent, Debouncer};
use crate::fsm::sequencer::Sequencer;
use crate::tick::{TickCounter, TickSource};

use super::ports::{LineTransport, TwoWire};

/// Snapshot of the service counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub presses: u32,
    pub cycles: u32,
    pub sensor_failures: u32,
    /// Ticks that arrived after their source was disabled and were ignored.
    pub missed_ticks: u32,
}

pub struct AppService<F, B, T, L>
where
    F: FnMut(),
    B: TwoWire,
    T: LineTransport,
    L: StatefulOutputPin,
{
    debouncer: Debouncer<F>,
    sequencer: Sequencer<B, T>,
    blinker: PressBlinker<L>,
    missed_ticks: TickCounter,
}

impl<F, B, T, L> AppService<F, B, T, L>
where
    F: FnMut(),
    B: TwoWire,
    T: LineTransport,
    L: StatefulOutputPin,
{
    /// Build every machine from a validated configuration. `on_press` runs
    /// once per confirmed press, in addition to queuing blinks.
    pub fn new(
        config: &SystemConfig,
        on_press: F,
        bus: B,
        transport: T,
        led: L,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let service = Self {
            debouncer: Debouncer::new(&config.debounce, on_press)?,
            sequencer: Sequencer::new(&config.sequencer, &config.modem, bus, transport)?,
            blinker: PressBlinker::new(&config.blink, led)?,
            missed_ticks: TickCounter::new(),
        };
        info!(
            "AppService ready: debounce {} ms, cycle {} ms",
            config.debounce.latency_ms(),
            config.sequencer.cycle_ms()
        );
        Ok(service)
    }

    /// Dispatch one queued event.
    pub fn handle_event(
        &mut self,
        event: Event,
        input: &mut impl InputPin,
        debounce_tick: &mut impl TickSource,
    ) {
        match event {
            Event::InputEdge => {
                if !debounce_tick.is_enabled() {
                    debug!("edge: opening debounce window");
                    debounce_tick.enable();
                }
            }
            Event::DebounceTick => {
                // Queued before the window closed.
                if !debounce_tick.is_enabled() {
                    self.missed_ticks.increment();
                    return;
                }
                match self.debouncer.sample(input) {
                    Some(DebounceEvent::Pressed) => self.blinker.on_press(),
                    Some(DebounceEvent::Released) => {
                        debounce_tick.disable();
                        debug!("debounce: window closed");
                    }
                    None => {}
                }
            }
            Event::SequencerTick => {
                self.sequencer.tick();
            }
            Event::BlinkTick => {
                self.blinker.tick();
            }
        }
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            presses: self.debouncer.presses(),
            cycles: self.sequencer.cycles(),
            sensor_failures: self.sequencer.sensor_failures(),
            missed_ticks: self.missed_ticks.get(),
        }
    }

    pub fn debouncer(&self) -> &Debouncer<F> {
        &self.debouncer
    }

    pub fn sequencer(&self) -> &Sequencer<B, T> {
        &self.sequencer
    }

    pub fn blinker(&self) -> &PressBlinker<L> {
        &self.blinker
    }
}
