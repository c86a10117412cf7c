//! Shift-register debounce FSM for a noisy digital input.
//!
//! ```text
//!              ┌────────[window all 0, no action taken]────▶ CONFIRMED_LOW
//!              │                                              (run action,
//!   SAMPLING ──┤                                               mark taken)
//!      ▲       └────────[window all 1]───────────────────▶ CONFIRMED_HIGH
//!      │                                                      (clear taken)
//!      └──────────────── both hand straight back ◀─────────────────┘
//! ```
//!
//! Every fast tick shifts the raw level into an 8-bit pattern; the newest
//! `width` bits form the window. The line is active-low: an all-zero window
//! is a confirmed press and fires the user action once, an all-one window
//! is a confirmed release that re-arms it. A window that never settles
//! simply keeps the machine in `Sampling`.
//!
//! Debounce latency is `width × tick period` (see
//! [`DebounceConfig::latency_ms`]).

use embedded_hal::digital::InputPin;
use log::debug;

use super::{Fsm, StateDescriptor, StateId};
use crate::app::ports::read_level;
use crate::config::DebounceConfig;
use crate::error::ConfigError;
use crate::tick::TickCounter;

/// The line idles high behind its pull-up, so the register starts released.
const PATTERN_SEED: u8 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DebounceState {
    Sampling = 0,
    ConfirmedLow = 1,
    ConfirmedHigh = 2,
}

impl StateId for DebounceState {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }
}

/// Clean events produced by the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceEvent {
    /// Line settled low; the user action has run.
    Pressed,
    /// Line settled high; the next press is armed.
    Released,
}

/// Per-instance data threaded through the handlers.
pub struct DebounceContext<A> {
    pattern: u8,
    mask: u8,
    level: bool,
    action_taken: bool,
    presses: TickCounter,
    event: Option<DebounceEvent>,
    action: A,
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table
// ═══════════════════════════════════════════════════════════════════════════

fn build_state_table<A: FnMut()>() -> [StateDescriptor<DebounceState, DebounceContext<A>>; 3] {
    [
        StateDescriptor {
            id: DebounceState::Sampling,
            name: "Sampling",
            on_enter: None,
            on_exit: None,
            on_update: sampling_update::<A>,
            then: None,
        },
        StateDescriptor {
            id: DebounceState::ConfirmedLow,
            name: "ConfirmedLow",
            on_enter: Some(confirmed_low_enter::<A>),
            on_exit: None,
            on_update: back_to_sampling::<A>,
            then: Some(DebounceState::Sampling),
        },
        StateDescriptor {
            id: DebounceState::ConfirmedHigh,
            name: "ConfirmedHigh",
            on_enter: Some(confirmed_high_enter::<A>),
            on_exit: None,
            on_update: back_to_sampling::<A>,
            then: Some(DebounceState::Sampling),
        },
    ]
}

fn sampling_update<A>(ctx: &mut DebounceContext<A>) -> Option<DebounceState> {
    ctx.pattern = (ctx.pattern << 1) | u8::from(ctx.level);
    let window = ctx.pattern & ctx.mask;

    if !ctx.action_taken && window == 0 {
        Some(DebounceState::ConfirmedLow)
    } else if window == ctx.mask {
        Some(DebounceState::ConfirmedHigh)
    } else {
        None
    }
}

fn back_to_sampling<A>(_: &mut DebounceContext<A>) -> Option<DebounceState> {
    Some(DebounceState::Sampling)
}

fn confirmed_low_enter<A: FnMut()>(ctx: &mut DebounceContext<A>) {
    (ctx.action)();
    ctx.action_taken = true;
    let count = ctx.presses.increment();
    ctx.event = Some(DebounceEvent::Pressed);
    debug!("debounce: press confirmed (#{})", count);
}

fn confirmed_high_enter<A>(ctx: &mut DebounceContext<A>) {
    ctx.action_taken = false;
    ctx.event = Some(DebounceEvent::Released);
    debug!("debounce: release confirmed");
}

// ═══════════════════════════════════════════════════════════════════════════
//  Debouncer
// ═══════════════════════════════════════════════════════════════════════════

/// Debounce FSM instance owning its pattern register and user action.
pub struct Debouncer<A: FnMut()> {
    fsm: Fsm<DebounceState, DebounceContext<A>, 3>,
    ctx: DebounceContext<A>,
}

impl<A: FnMut()> Debouncer<A> {
    /// Build a debouncer that runs `action` once per confirmed press.
    pub fn new(config: &DebounceConfig, action: A) -> Result<Self, ConfigError> {
        config.validate()?;
        let fsm = Fsm::new(build_state_table::<A>(), DebounceState::Sampling)?;
        Ok(Self {
            fsm,
            ctx: DebounceContext {
                pattern: PATTERN_SEED,
                mask: config.mask(),
                level: true,
                action_taken: false,
                presses: TickCounter::new(),
                event: None,
                action,
            },
        })
    }

    /// Feed one raw sample. Call once per fast tick while the window is open.
    pub fn tick(&mut self, level: bool) -> Option<DebounceEvent> {
        self.ctx.level = level;
        self.ctx.event = None;
        self.fsm.tick(&mut self.ctx);
        self.ctx.event.take()
    }

    /// Read the input pin and feed the sample.
    pub fn sample<P: InputPin>(&mut self, pin: &mut P) -> Option<DebounceEvent> {
        let level = read_level(pin);
        self.tick(level)
    }

    pub fn state(&self) -> DebounceState {
        self.fsm.current_state()
    }

    /// Raw shift register contents.
    pub fn pattern(&self) -> u8 {
        self.ctx.pattern
    }

    /// True between a confirmed press and the following confirmed release.
    pub fn is_pressed(&self) -> bool {
        self.ctx.action_taken
    }

    /// Confirmed presses since construction.
    pub fn presses(&self) -> u32 {
        self.ctx.presses.get()
    }

    /// Ticks delivered since construction.
    pub fn ticks(&self) -> u64 {
        self.fsm.total_ticks()
    }
}
