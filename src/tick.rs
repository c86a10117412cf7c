//! Tick sources and the state they share with non-tick code.
//!
//! ```text
//! ┌──────────────┐ on_tick  ┌──────────────┐ deliver  ┌──────────────┐
//! │ Tick source  │─────────▶│  callback    │─────────▶│  TickCell<T> │
//! │ (hw counter) │          │ (push event) │          │  (FSM owner) │
//! └──────────────┘          └──────────────┘          └──────────────┘
//! ```
//!
//! Ticks never nest: a [`TickCell`] runs each delivery inside a critical
//! section and rejects a delivery that arrives while the previous one
//! still holds the cell. Counters wider than the platform's atomic width
//! live in a [`TickCounter`] and are only touched inside a critical
//! section, so a reader outside tick context never sees a torn value.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use log::warn;

use crate::error::TickError;

// ---------------------------------------------------------------------------
// TickCounter
// ---------------------------------------------------------------------------

/// Multi-byte tick counter shared between tick and non-tick context.
pub struct TickCounter(Mutex<Cell<u32>>);

impl TickCounter {
    pub const fn new() -> Self {
        Self(Mutex::new(Cell::new(0)))
    }

    /// Add one tick and return the new count.
    pub fn increment(&self) -> u32 {
        critical_section::with(|cs| {
            let cell = self.0.borrow(cs);
            let next = cell.get().wrapping_add(1);
            cell.set(next);
            next
        })
    }

    pub fn reset(&self) {
        critical_section::with(|cs| self.0.borrow(cs).set(0));
    }

    pub fn get(&self) -> u32 {
        critical_section::with(|cs| self.0.borrow(cs).get())
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// TickCell
// ---------------------------------------------------------------------------

/// Owner slot for an FSM driven straight from interrupt context.
///
/// Put one in a `static`, [`install`](Self::install) the FSM before
/// enabling its tick source, and call [`deliver`](Self::deliver) from the
/// tick handler.
pub struct TickCell<T> {
    slot: Mutex<RefCell<Option<T>>>,
    missed: TickCounter,
}

impl<T> TickCell<T> {
    pub const fn empty() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
            missed: TickCounter::new(),
        }
    }

    /// Install (or replace) the owned value.
    pub fn install(&self, value: T) {
        critical_section::with(|cs| {
            *self.slot.borrow_ref_mut(cs) = Some(value);
        });
    }

    /// Remove the owned value.
    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).take())
    }

    /// Run `f` on the owned value with tick delivery excluded.
    ///
    /// A nested delivery (the value is still borrowed) is rejected with
    /// [`TickError::Reentrant`] and counted in [`missed`](Self::missed).
    pub fn deliver<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, TickError> {
        critical_section::with(|cs| {
            let Ok(mut slot) = self.slot.borrow(cs).try_borrow_mut() else {
                self.missed.increment();
                warn!("tick: delivery while previous update in progress");
                return Err(TickError::Reentrant);
            };
            let value = slot.as_mut().ok_or(TickError::Uninstalled)?;
            Ok(f(value))
        })
    }

    /// Deliveries rejected because an update was still running.
    pub fn missed(&self) -> u32 {
        self.missed.get()
    }
}

// ---------------------------------------------------------------------------
// Tick sources
// ---------------------------------------------------------------------------

/// Handler invoked once per tick. Runs in tick (interrupt) context.
pub type TickCallback = fn();

/// A periodic tick generator.
pub trait TickSource {
    /// Register the handler called on each tick.
    fn on_tick(&mut self, callback: TickCallback);

    fn enable(&mut self);

    fn disable(&mut self);

    fn is_enabled(&self) -> bool;
}

/// Free-running software counter standing in for a hardware timer.
///
/// [`advance`](Self::advance) adds elapsed time; every full period
/// raises one tick while the timer is enabled. Time that passes while
/// disabled is discarded, and re-enabling restarts the period.
pub struct SoftTimer {
    period_ms: u32,
    elapsed_ms: u32,
    enabled: bool,
    callback: Option<TickCallback>,
    raised: TickCounter,
}

impl SoftTimer {
    /// Create a disabled timer. `period_ms` must be non-zero; configs are
    /// validated before timers are built.
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms: period_ms.max(1),
            elapsed_ms: 0,
            enabled: false,
            callback: None,
            raised: TickCounter::new(),
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Advance the counter by `ms` and raise any ticks that fall due.
    /// Returns the number of ticks raised.
    pub fn advance(&mut self, ms: u32) -> u32 {
        if !self.enabled {
            return 0;
        }
        self.elapsed_ms += ms;
        let mut fired = 0;
        while self.elapsed_ms >= self.period_ms {
            self.elapsed_ms -= self.period_ms;
            self.raised.increment();
            if let Some(cb) = self.callback {
                cb();
            }
            fired += 1;
        }
        fired
    }

    /// Ticks raised since construction.
    pub fn raised(&self) -> u32 {
        self.raised.get()
    }
}

impl TickSource for SoftTimer {
    fn on_tick(&mut self, callback: TickCallback) {
        self.callback = Some(callback);
    }

    fn enable(&mut self) {
        if !self.enabled {
            self.elapsed_ms = 0;
            self.enabled = true;
        }
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
