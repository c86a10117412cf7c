//! Integration tests for the edge → debounce tick → action pipeline.
//!
//! Each test owns its event queue and tick callback so tests can run in
//! parallel without sharing the global queue.

use std::sync::atomic::{AtomicU32, Ordering};

use tickfsm::app::service::AppService;
use tickfsm::config::SystemConfig;
use tickfsm::events::{Event, EventQueue};
use tickfsm::fsm::debounce::DebounceState;
use tickfsm::sensors::dht12::Reading;
use tickfsm::tick::{SoftTimer, TickSource};

use crate::mock_hw::{MockBus, MockButton, MockLed, RecordingTransport};

type Service = AppService<fn(), MockBus, RecordingTransport, MockLed>;

fn make_service(on_press: fn()) -> Service {
    AppService::new(
        &SystemConfig::default(),
        on_press,
        MockBus::new(Reading::default()),
        RecordingTransport::default(),
        MockLed::default(),
    )
    .unwrap()
}

/// Active-low button with `bounce_ms` of chatter after make and break.
fn level_at(t: u32, presses: &[(u32, u32)], bounce_ms: u32) -> bool {
    for &(at, hold) in presses {
        let release = at + hold;
        if (at..at + bounce_ms).contains(&t) {
            return (t - at) % 2 == 1;
        }
        if (release..release + bounce_ms).contains(&t) {
            return (t - release) % 2 == 0;
        }
        if (at..release).contains(&t) {
            return false;
        }
    }
    true
}

// ── Bouncing presses → one action each ────────────────────────

#[test]
fn noisy_presses_yield_one_action_each() {
    static QUEUE: EventQueue<64> = EventQueue::new();
    static ACTIONS: AtomicU32 = AtomicU32::new(0);
    fn debounce_tick() {
        QUEUE.push(Event::DebounceTick).unwrap();
    }
    fn count_action() {
        ACTIONS.fetch_add(1, Ordering::SeqCst);
    }

    let mut svc = make_service(count_action);
    let mut button = MockButton::new();
    let mut timer = SoftTimer::new(16);
    timer.on_tick(debounce_tick);

    let presses = [(100, 300), (600, 200)];
    let mut was_high = true;
    for t in 0..1000 {
        button.high = level_at(t, &presses, 5);
        if was_high && !button.high {
            QUEUE.push(Event::InputEdge).unwrap();
        }
        was_high = button.high;
        timer.advance(1);
        QUEUE.drain(|e| svc.handle_event(e, &mut button, &mut timer));
    }

    assert_eq!(ACTIONS.load(Ordering::SeqCst), 2);
    assert_eq!(svc.stats().presses, 2);
    assert_eq!(svc.blinker().pending(), 4);
    assert!(!timer.is_enabled(), "window should close after release");
    assert_eq!(QUEUE.dropped(), 0);
}

// ── Window closed → no sampling ───────────────────────────────

#[test]
fn input_is_not_read_while_window_closed() {
    static QUEUE: EventQueue<8> = EventQueue::new();
    fn debounce_tick() {
        QUEUE.push(Event::DebounceTick).unwrap();
    }

    let mut svc = make_service(|| {});
    let mut button = MockButton::new();
    let mut timer = SoftTimer::new(16);
    timer.on_tick(debounce_tick);

    for _ in 0..200 {
        timer.advance(1);
        QUEUE.drain(|e| svc.handle_event(e, &mut button, &mut timer));
    }
    assert_eq!(button.reads, 0);
    assert_eq!(svc.debouncer().ticks(), 0);
}

// ── Disable/enable idempotence ────────────────────────────────

#[test]
fn reenabling_tick_leaves_pattern_and_state_unchanged() {
    static QUEUE: EventQueue<8> = EventQueue::new();
    fn debounce_tick() {
        QUEUE.push(Event::DebounceTick).unwrap();
    }

    let mut svc = make_service(|| {});
    let mut button = MockButton::new();
    let mut timer = SoftTimer::new(16);
    timer.on_tick(debounce_tick);

    button.high = false;
    svc.handle_event(Event::InputEdge, &mut button, &mut timer);
    timer.advance(32);
    QUEUE.drain(|e| svc.handle_event(e, &mut button, &mut timer));
    assert_eq!(svc.debouncer().ticks(), 2);

    let pattern = svc.debouncer().pattern();
    let state = svc.debouncer().state();

    timer.disable();
    timer.enable();
    QUEUE.drain(|e| svc.handle_event(e, &mut button, &mut timer));

    assert_eq!(svc.debouncer().pattern(), pattern);
    assert_eq!(svc.debouncer().state(), state);
    assert_eq!(state, DebounceState::Sampling);
    assert_eq!(svc.stats().presses, 0);

    // The third low sample still completes the press.
    timer.advance(16);
    QUEUE.drain(|e| svc.handle_event(e, &mut button, &mut timer));
    assert_eq!(svc.stats().presses, 1);
}

#[test]
fn tick_queued_before_disable_is_counted_stale() {
    let mut svc = make_service(|| {});
    let mut button = MockButton::new();
    let mut timer = SoftTimer::new(16);

    timer.enable();
    timer.disable();
    let pattern = svc.debouncer().pattern();
    svc.handle_event(Event::DebounceTick, &mut button, &mut timer);

    assert_eq!(svc.stats().missed_ticks, 1);
    assert_eq!(svc.debouncer().pattern(), pattern);
    assert_eq!(button.reads, 0);
}

// ── Press → delayed blink playback ────────────────────────────

#[test]
fn press_plays_back_as_blinks_after_hold_off() {
    let mut svc = make_service(|| {});
    let mut button = MockButton::new();
    let mut timer = SoftTimer::new(16);

    button.high = false;
    svc.handle_event(Event::InputEdge, &mut button, &mut timer);
    for _ in 0..3 {
        svc.handle_event(Event::DebounceTick, &mut button, &mut timer);
    }
    assert_eq!(svc.stats().presses, 1);

    for _ in 0..7 {
        svc.handle_event(Event::BlinkTick, &mut button, &mut timer);
    }
    assert_eq!(svc.blinker().led().toggles, 0);

    for _ in 0..5 {
        svc.handle_event(Event::BlinkTick, &mut button, &mut timer);
    }
    assert_eq!(svc.blinker().led().toggles, 2);
    assert!(!svc.blinker().led().high);
}
