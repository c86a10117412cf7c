//! Dwell-time pattern FSM (Moore machine over a fixed table).
//!
//! Each row names an output action, how many ticks to dwell, and the
//! successor for each value of a one-bit input:
//!
//! ```text
//!   ┌──────┬──────────┬───────┬────────────┬──────────┐
//!   │ row  │ action   │ dwell │ next[0]    │ next[1]  │
//!   ├──────┼──────────┼───────┼────────────┼──────────┤
//!   │ On   │ led on   │   5   │ Off        │ Off      │
//!   │ Off  │ led off  │   2   │ Blink      │ Blink    │
//!   │ Blink│ toggle   │  10   │ On         │ Off      │
//!   └──────┴──────────┴───────┴────────────┴──────────┘
//! ```
//!
//! The action runs once on entry; rows with a `repeat` action also run it
//! on every tick spent dwelling. Nothing blocks: waiting is counted in
//! ticks delivered by the caller.

use embedded_hal::digital::{OutputPin, StatefulOutputPin};
use log::{debug, warn};

use crate::error::ConfigError;

/// Output action applied to the machine's output.
pub type OutputFn<O> = fn(&mut O);

/// One row of a timed table.
pub struct TimedRow<O> {
    pub name: &'static str,
    pub action: OutputFn<O>,
    /// Optional action repeated on every dwell tick.
    pub repeat: Option<OutputFn<O>>,
    /// Ticks spent in the row before the input is consulted.
    pub dwell: u16,
    /// Successor row index for input `false` / `true`.
    pub next: [usize; 2],
}

/// Table-driven timed machine owning its output.
pub struct TimedFsm<O, const N: usize> {
    table: [TimedRow<O>; N],
    current: usize,
    elapsed: u16,
    output: O,
}

impl<O, const N: usize> TimedFsm<O, N> {
    /// Validate the table and enter `initial`, running its action.
    pub fn new(table: [TimedRow<O>; N], initial: usize, output: O) -> Result<Self, ConfigError> {
        if initial >= N {
            return Err(ConfigError::StateTable("initial row outside table"));
        }
        for row in &table {
            if row.dwell == 0 {
                return Err(ConfigError::StateTable("row with zero dwell"));
            }
            if row.next.iter().any(|&n| n >= N) {
                return Err(ConfigError::StateTable("successor outside table"));
            }
        }
        let mut fsm = Self {
            table,
            current: initial,
            elapsed: 0,
            output,
        };
        (fsm.table[initial].action)(&mut fsm.output);
        Ok(fsm)
    }

    /// Advance one tick with the current input bit. Returns the index of
    /// the row entered, if the dwell expired.
    pub fn tick(&mut self, input: bool) -> Option<usize> {
        self.elapsed = self.elapsed.saturating_add(1);
        let row = &self.table[self.current];
        if self.elapsed < row.dwell {
            if let Some(repeat) = row.repeat {
                repeat(&mut self.output);
            }
            return None;
        }

        let next = row.next[usize::from(input)];
        debug!("timed: {} -> {}", row.name, self.table[next].name);
        self.current = next;
        self.elapsed = 0;
        (self.table[next].action)(&mut self.output);
        Some(next)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_name(&self) -> &'static str {
        self.table[self.current].name
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Status LED pattern
// ═══════════════════════════════════════════════════════════════════════════

pub const LED_ON: usize = 0;
pub const LED_OFF: usize = 1;
pub const LED_BLINK: usize = 2;

fn led_on<P: OutputPin>(pin: &mut P) {
    if pin.set_high().is_err() {
        warn!("status led: set_high failed");
    }
}

fn led_off<P: OutputPin>(pin: &mut P) {
    if pin.set_low().is_err() {
        warn!("status led: set_low failed");
    }
}

fn led_toggle<P: StatefulOutputPin>(pin: &mut P) {
    if pin.toggle().is_err() {
        warn!("status led: toggle failed");
    }
}

/// On 5 ticks, off 2, blink 10, then back to on (input low) or off
/// (input high).
pub fn led_pattern_table<P: StatefulOutputPin>() -> [TimedRow<P>; 3] {
    [
        TimedRow {
            name: "On",
            action: led_on::<P>,
            repeat: None,
            dwell: 5,
            next: [LED_OFF, LED_OFF],
        },
        TimedRow {
            name: "Off",
            action: led_off::<P>,
            repeat: None,
            dwell: 2,
            next: [LED_BLINK, LED_BLINK],
        },
        TimedRow {
            name: "Blink",
            action: led_toggle::<P>,
            repeat: Some(led_toggle::<P>),
            dwell: 10,
            next: [LED_ON, LED_OFF],
        },
    ]
}

/// Status LED running [`led_pattern_table`].
pub type StatusLed<P> = TimedFsm<P, 3>;

pub fn status_led<P: StatefulOutputPin>(pin: P) -> Result<StatusLed<P>, ConfigError> {
    TimedFsm::new(led_pattern_table::<P>(), LED_ON, pin)
}
