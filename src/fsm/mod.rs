//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust, generic over the state set
//! and the context each instance threads through its handlers:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable<S, C>                                                │
//! │  ┌──────────┬───────────┬──────────┬───────────────────┬───────┐ │
//! │  │ StateId  │ on_enter  │ on_exit  │ on_update         │ then  │ │
//! │  ├──────────┼───────────┼──────────┼───────────────────┼───────┤ │
//! │  │ S::A     │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │ None  │ │
//! │  │ S::B     │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ S::A  │ │
//! │  └──────────┴───────────┴──────────┴───────────────────┴───────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next)` with `next != current`, the engine runs
//! `on_exit` for the current state, then `on_enter` for the next.  A row
//! with `then: Some(s)` is transient: right after its `on_enter` the
//! engine hands control to `s` within the same tick.  Exactly one
//! transition is evaluated per tick; the transient hop is part of entry.
//!
//! The engine itself is not re-entrant and takes `&mut self`; sharing an
//! instance with interrupt context goes through [`crate::tick::TickCell`].

pub mod debounce;
pub mod sequencer;
pub mod timed;

use log::debug;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// A closed set of states usable as a table index.
pub trait StateId: Copy + Eq + core::fmt::Debug {
    /// Total number of states, used to size the table array.
    const COUNT: usize;

    /// Row index of this state in its table.
    fn index(self) -> usize;
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn<C> = fn(&mut C);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn<S, C> = fn(&mut C) -> Option<S>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array; no heap, no `dyn`.
pub struct StateDescriptor<S, C> {
    pub id: S,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<C>>,
    pub on_exit: Option<StateActionFn<C>>,
    pub on_update: StateUpdateFn<S, C>,
    /// Fixed successor for transient states.
    pub then: Option<S>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table and the index of the current row. The context is
/// owned by the caller and lent to every tick.
pub struct Fsm<S: StateId, C, const N: usize> {
    /// Fixed-size table indexed by `S::index()`.
    table: [StateDescriptor<S, C>; N],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
}

impl<S: StateId, C, const N: usize> Fsm<S, C, N> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    ///
    /// The table is checked once here: one row per state, rows in index
    /// order, transient rows pointing at a stable successor.
    pub fn new(table: [StateDescriptor<S, C>; N], initial: S) -> Result<Self, ConfigError> {
        if N != S::COUNT {
            return Err(ConfigError::StateTable("row count does not match state count"));
        }
        for (i, row) in table.iter().enumerate() {
            if row.id.index() != i {
                return Err(ConfigError::StateTable("rows out of index order"));
            }
            if let Some(next) = row.then {
                match table.get(next.index()) {
                    Some(target) if target.then.is_none() => {}
                    Some(_) => {
                        return Err(ConfigError::StateTable("transient state chains to transient"));
                    }
                    None => return Err(ConfigError::StateTable("successor outside table")),
                }
            }
        }
        let current = initial.index();
        match table.get(current) {
            Some(row) if row.then.is_none() => {}
            _ => return Err(ConfigError::StateTable("initial state must be stable")),
        }

        Ok(Self {
            table,
            current,
            tick_count: 0,
        })
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut C) {
        debug!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// Returns the state entered by this tick's transition (the transient
    /// state itself if one was passed through), or `None` if it stayed.
    pub fn tick(&mut self, ctx: &mut C) -> Option<S> {
        self.tick_count += 1;

        let next = (self.table[self.current].on_update)(ctx)?;
        if next.index() == self.current {
            return None;
        }
        self.transition(next, ctx);
        Some(next)
    }

    /// The current state's identity.
    pub fn current_state(&self) -> S {
        self.table[self.current].id
    }

    /// Ticks delivered since construction.
    pub fn total_ticks(&self) -> u64 {
        self.tick_count
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: S, ctx: &mut C) {
        self.enter(next, ctx);
        if let Some(then) = self.table[self.current].then {
            self.enter(then, ctx);
        }
    }

    fn enter(&mut self, next: S, ctx: &mut C) {
        let next_idx = next.index();

        debug!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
