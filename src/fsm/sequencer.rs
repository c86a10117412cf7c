//! Measure-and-transmit sequencer driven by the slow tick.
//!
//! ```text
//!  tick count:   1            2              3                4
//!  IDLE ──▶ READ_SENSOR ──▶ SESSION_START ──▶ ANNOUNCE_LENGTH ──▶ SEND_PAYLOAD
//!    ▲                                                                │
//!    └────────────── ticks 5 .. L-1 idle; at L counter resets ◀───────┘
//! ```
//!
//! Each active state performs exactly one peripheral interaction in its
//! `on_enter`, so consecutive modem commands are always at least one slow
//! tick apart without any blocking delay. The phase is chosen by strict
//! equality on the tick count, and the count only advances on a delivered
//! tick: a tick lost before delivery shifts every later phase of the cycle
//! by one period and stretches the cycle by the same amount.
//!
//! A sensor that does not answer leaves the payload untouched and the
//! cycle runs on; operators see repeated identical readings.

use log::{info, warn};

use super::{Fsm, StateDescriptor, StateId};
use crate::app::ports::{LineTransport, TwoWire};
use crate::config::{ModemConfig, SequencerConfig};
use crate::error::ConfigError;
use crate::modem::{self, Line};
use crate::sensors::dht12::{self, Reading};
use crate::tick::TickCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SequencerState {
    Idle = 0,
    ReadSensor = 1,
    SessionStart = 2,
    AnnounceLength = 3,
    SendPayload = 4,
}

impl StateId for SequencerState {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-instance data threaded through the handlers.
pub struct SequencerContext<B, T> {
    /// Ticks since the start of the current cycle.
    phase: TickCounter,
    cycle_length: u32,
    sensor_address: u8,
    modem: ModemConfig,
    /// Written by READ_SENSOR, consumed by the transmit states.
    payload: Reading,
    /// Request formatted by ANNOUNCE_LENGTH, taken by SEND_PAYLOAD.
    request: Option<Line>,
    cycles: TickCounter,
    sensor_failures: TickCounter,
    bus: B,
    transport: T,
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table
// ═══════════════════════════════════════════════════════════════════════════

fn build_state_table<B: TwoWire, T: LineTransport>()
-> [StateDescriptor<SequencerState, SequencerContext<B, T>>; 5] {
    [
        StateDescriptor {
            id: SequencerState::Idle,
            name: "Idle",
            on_enter: None,
            on_exit: None,
            on_update: phase_update::<B, T>,
            then: None,
        },
        StateDescriptor {
            id: SequencerState::ReadSensor,
            name: "ReadSensor",
            on_enter: Some(read_sensor_enter::<B, T>),
            on_exit: None,
            on_update: phase_update::<B, T>,
            then: None,
        },
        StateDescriptor {
            id: SequencerState::SessionStart,
            name: "SessionStart",
            on_enter: Some(session_start_enter::<B, T>),
            on_exit: None,
            on_update: phase_update::<B, T>,
            then: None,
        },
        StateDescriptor {
            id: SequencerState::AnnounceLength,
            name: "AnnounceLength",
            on_enter: Some(announce_length_enter::<B, T>),
            on_exit: None,
            on_update: phase_update::<B, T>,
            then: None,
        },
        StateDescriptor {
            id: SequencerState::SendPayload,
            name: "SendPayload",
            on_enter: Some(send_payload_enter::<B, T>),
            on_exit: None,
            on_update: phase_update::<B, T>,
            then: None,
        },
    ]
}

/// Phase lookup shared by every state. The counter has already been
/// advanced for this tick.
fn phase_update<B, T>(ctx: &mut SequencerContext<B, T>) -> Option<SequencerState> {
    let count = ctx.phase.get();
    let next = match count {
        1 => SequencerState::ReadSensor,
        2 => SequencerState::SessionStart,
        3 => SequencerState::AnnounceLength,
        4 => SequencerState::SendPayload,
        n if n == ctx.cycle_length => {
            ctx.phase.reset();
            ctx.cycles.increment();
            SequencerState::Idle
        }
        _ => SequencerState::Idle,
    };
    Some(next)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Active states
// ═══════════════════════════════════════════════════════════════════════════

fn read_sensor_enter<B: TwoWire, T>(ctx: &mut SequencerContext<B, T>) {
    match dht12::read(&mut ctx.bus, ctx.sensor_address) {
        Ok(reading) => ctx.payload = reading,
        Err(e) => {
            ctx.sensor_failures.increment();
            warn!("READ_SENSOR: {}, keeping {}", e, ctx.payload);
        }
    }
}

fn session_start_enter<B, T: LineTransport>(ctx: &mut SequencerContext<B, T>) {
    match modem::session_open(&ctx.modem) {
        Ok(line) => ctx.transport.send_line(&line),
        Err(e) => warn!("SESSION_START: {}", e),
    }
}

fn announce_length_enter<B, T: LineTransport>(ctx: &mut SequencerContext<B, T>) {
    match modem::format_request(&ctx.modem, &ctx.payload) {
        Ok(request) => {
            let bytes = modem::wire_len(&request);
            ctx.transport.send_line(&modem::announce_length(bytes));
            ctx.request = Some(request);
        }
        Err(e) => {
            ctx.request = None;
            warn!("ANNOUNCE_LENGTH: {}", e);
        }
    }
}

fn send_payload_enter<B, T: LineTransport>(ctx: &mut SequencerContext<B, T>) {
    match ctx.request.take() {
        Some(request) => {
            ctx.transport.send_line(&request);
            info!("SEND_PAYLOAD: sent {}", ctx.payload);
        }
        None => warn!("SEND_PAYLOAD: nothing announced this cycle"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Sequencer
// ═══════════════════════════════════════════════════════════════════════════

/// Sequencer FSM instance owning its bus and transport proxies.
pub struct Sequencer<B: TwoWire, T: LineTransport> {
    fsm: Fsm<SequencerState, SequencerContext<B, T>, 5>,
    ctx: SequencerContext<B, T>,
}

impl<B: TwoWire, T: LineTransport> Sequencer<B, T> {
    pub fn new(
        config: &SequencerConfig,
        modem: &ModemConfig,
        bus: B,
        transport: T,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        modem.validate()?;
        let mut fsm = Fsm::new(build_state_table::<B, T>(), SequencerState::Idle)?;
        let mut ctx = SequencerContext {
            phase: TickCounter::new(),
            cycle_length: config.cycle_length as u32,
            sensor_address: config.sensor_address,
            modem: modem.clone(),
            payload: Reading::default(),
            request: None,
            cycles: TickCounter::new(),
            sensor_failures: TickCounter::new(),
            bus,
            transport,
        };
        fsm.start(&mut ctx);
        info!(
            "sequencer: {} ticks x {} ms per cycle",
            config.cycle_length, config.tick_period_ms
        );
        Ok(Self { fsm, ctx })
    }

    /// Advance one slow tick. Returns the state entered, if any.
    pub fn tick(&mut self) -> Option<SequencerState> {
        self.ctx.phase.increment();
        self.fsm.tick(&mut self.ctx)
    }

    pub fn state(&self) -> SequencerState {
        self.fsm.current_state()
    }

    /// Ticks into the current cycle. Safe to read outside tick context.
    pub fn phase(&self) -> u32 {
        self.ctx.phase.get()
    }

    /// Last successfully read payload.
    pub fn payload(&self) -> Reading {
        self.ctx.payload
    }

    /// Cycles completed (counter wrapped at the cycle length).
    pub fn cycles(&self) -> u32 {
        self.ctx.cycles.get()
    }

    pub fn sensor_failures(&self) -> u32 {
        self.ctx.sensor_failures.get()
    }

    pub fn bus(&self) -> &B {
        &self.ctx.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.ctx.bus
    }

    pub fn transport(&self) -> &T {
        &self.ctx.transport
    }
}
