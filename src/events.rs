//! Interrupt-driven event system.
//!
//! Events are produced by:
//! - the input-edge interrupt (a candidate press has started)
//! - tick callbacks (debounce, sequencer, blink)
//!
//! Events are consumed by the single-threaded main loop, strictly in
//! arrival order, and dispatched to [`AppService`](crate::app::service::AppService).
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Edge ISR    │────▶│              │     │              │
//! │ Fast tick   │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Slow tick   │────▶│   (FIFO)     │     │  (consumer)  │
//! │ Blink tick  │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;
use log::warn;

use crate::error::TickError;
use crate::tick::TickCounter;

/// Capacity of the global queue.
pub const EVENT_QUEUE_CAP: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Falling edge on the debounced input; opens a debounce window.
    InputEdge = 0,
    /// Fast debounce tick.
    DebounceTick = 1,
    /// Slow sequencer tick.
    SequencerTick = 2,
    /// Press-blinker tick.
    BlinkTick = 3,
}

/// Fixed-capacity FIFO shared between tick context (producer) and the
/// main loop (consumer). Each operation runs in a critical section.
pub struct EventQueue<const N: usize> {
    inner: Mutex<RefCell<Deque<Event, N>>>,
    dropped: TickCounter,
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
            dropped: TickCounter::new(),
        }
    }

    /// Push an event. Safe to call from tick context.
    /// A full queue drops the event and counts it.
    pub fn push(&self, event: Event) -> Result<(), TickError> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).push_back(event)).map_err(|_| {
            self.dropped.increment();
            TickError::QueueFull
        })
    }

    /// Pop the oldest pending event.
    pub fn pop(&self) -> Option<Event> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    /// Drain all pending events into a callback, in FIFO order.
    ///
    /// Each event is popped in its own critical section so producers can
    /// run while the handler does.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events rejected because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.get()
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue fed by the tick callbacks below.
pub static EVENTS: EventQueue<EVENT_QUEUE_CAP> = EventQueue::new();

/// Push onto the global queue, logging drops.
pub fn push_event(event: Event) {
    if let Err(e) = EVENTS.push(event) {
        warn!("{}, dropped {:?}", e, event);
    }
}

/// Drain the global queue in FIFO order.
pub fn drain_events(handler: impl FnMut(Event)) {
    EVENTS.drain(handler);
}

// ── Tick callbacks (register with `TickSource::on_tick`) ──────

pub fn on_input_edge() {
    push_event(Event::InputEdge);
}

pub fn on_debounce_tick() {
    push_event(Event::DebounceTick);
}

pub fn on_sequencer_tick() {
    push_event(Event::SequencerTick);
}

pub fn on_blink_tick() {
    push_event(Event::BlinkTick);
}
