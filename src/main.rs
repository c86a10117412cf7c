//! tickfsm host simulator.
//!
//! Wires software timers, a scripted bouncing button, a simulated DHT12
//! and a logging modem transport into [`AppService`] and runs the event
//! loop for a fixed span of simulated time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SoftTimer (debounce)  SoftTimer (sequencer)  SoftTimer(blink)│
//! │  ScriptedButton edge detector                                │
//! │         │ push_event                                         │
//! │         ▼                                                    │
//! │  ┌────────────┐  drain   ┌──────────────────────────────┐    │
//! │  │ EVENTS     │─────────▶│ TickCell<AppService>          │    │
//! │  └────────────┘          │ Debouncer · Sequencer · Blink │    │
//! │                          └──────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `tickfsm-sim [simulated-ms]` (default 30000). Set `RUST_LOG`
//! to `debug` to see every state transition.

use anyhow::{Context, Result};
use log::{error, info, warn};

use tickfsm::adapters::sim::{LogTransport, Press, ScriptedButton, SimDht12, SimLed};
use tickfsm::app::service::AppService;
use tickfsm::config::{CONFIG_BLOB_MAX, SystemConfig};
use tickfsm::events;
use tickfsm::fsm::timed;
use tickfsm::modem;
use tickfsm::sensors::dht12;
use tickfsm::tick::{SoftTimer, TickCell, TickSource};
use tickfsm::{ConfigError, Error};

type SimService = AppService<fn(), SimDht12, LogTransport, SimLed>;

/// Owned by the event loop; ticks reach it only through `deliver`.
static APP: TickCell<SimService> = TickCell::empty();

const DEFAULT_RUN_MS: u32 = 30_000;
const STATUS_PERIOD_MS: u32 = 250;

fn on_press() {
    info!("button: press confirmed");
}

/// Configuration errors are fatal; log them before bailing out.
fn reject(e: ConfigError) -> Error {
    error!("configuration rejected: {}", e);
    Error::from(e)
}

fn sim_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    // Short cycle so a run shows several transmissions.
    config.sequencer.cycle_length = 10;
    config
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  tickfsm simulator v{}            ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let run_ms = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u32>()
            .with_context(|| format!("invalid simulated duration '{arg}'"))?,
        None => DEFAULT_RUN_MS,
    };

    // ── 1. Configuration (persisted form round-trip) ──────────
    let mut blob = [0u8; CONFIG_BLOB_MAX];
    let used = sim_config().encode(&mut blob).map_err(reject)?.len();
    let config = SystemConfig::decode(&blob[..used]).map_err(reject)?;
    info!(
        "Config: {} bytes persisted, debounce {} ms, cycle {} ms",
        used,
        config.debounce.latency_ms(),
        config.sequencer.cycle_ms()
    );

    // ── 2. Peripherals ────────────────────────────────────────
    let mut button = ScriptedButton::new(
        vec![
            Press { at_ms: 1_500, hold_ms: 300 },
            Press { at_ms: 2_400, hold_ms: 200 },
            Press { at_ms: 9_000, hold_ms: 1_200 },
        ],
        6,
    );
    let mut transport = LogTransport::default();
    modem::bring_up(&mut transport, &config.modem).map_err(reject)?;

    // An absent sensor is not fatal: the sequencer resends its last payload.
    let mut sensor = SimDht12::new(Some(4));
    match dht12::read(&mut sensor, config.sequencer.sensor_address) {
        Ok(reading) => info!("Sensor: first reading {}", reading),
        Err(e) => warn!("{}", Error::from(e)),
    }

    let mut status = timed::status_led(SimLed::new("status")).map_err(reject)?;

    let service = AppService::new(
        &config,
        on_press as fn(),
        sensor,
        transport,
        SimLed::new("blink"),
    )
    .map_err(reject)?;
    APP.install(service);

    // ── 3. Tick sources ───────────────────────────────────────
    let mut debounce_timer = SoftTimer::new(u32::from(config.debounce.tick_period_ms));
    debounce_timer.on_tick(events::on_debounce_tick);

    let mut sequencer_timer = SoftTimer::new(config.sequencer.tick_period_ms);
    sequencer_timer.on_tick(events::on_sequencer_tick);
    sequencer_timer.enable();

    let mut blink_timer = SoftTimer::new(u32::from(config.blink.tick_period_ms));
    blink_timer.on_tick(events::on_blink_tick);
    blink_timer.enable();

    let mut status_timer = SoftTimer::new(STATUS_PERIOD_MS);
    status_timer.enable();

    info!("System ready. Simulating {} ms.", run_ms);

    // ── 4. Event loop (1 ms resolution) ───────────────────────
    let mut line_high = true;
    for now in 0..run_ms {
        button.set_time(now);
        let level = button.level();
        if line_high && !level {
            events::on_input_edge();
        }
        line_high = level;

        debounce_timer.advance(1);
        sequencer_timer.advance(1);
        blink_timer.advance(1);
        for _ in 0..status_timer.advance(1) {
            status.tick(debounce_timer.is_enabled());
        }

        events::drain_events(|event| {
            let delivered =
                APP.deliver(|app| app.handle_event(event, &mut button, &mut debounce_timer));
            if let Err(e) = delivered {
                warn!("{:?} not delivered: {}", event, e);
            }
        });
    }

    // ── 5. Summary ────────────────────────────────────────────
    let stats = APP.deliver(|app| app.stats()).map_err(Error::from)?;
    let app = APP.take().context("service was never installed")?;
    let transport = app.sequencer().transport();
    info!(
        "Done: {} presses, {} cycles, {} sensor failures, {} stale ticks",
        stats.presses, stats.cycles, stats.sensor_failures, stats.missed_ticks
    );
    info!(
        "Modem: {} lines / {} bytes; last payload {}",
        transport.lines(),
        transport.bytes(),
        app.sequencer().payload()
    );
    info!(
        "LEDs: blink toggled {} times ({} pending), status in '{}' after {} changes",
        app.blinker().led().toggles(),
        app.blinker().pending(),
        status.current_name(),
        status.output().toggles()
    );
    if APP.missed() > 0 {
        warn!("{} ticks rejected while an update was running", APP.missed());
    }
    if events::EVENTS.dropped() > 0 {
        warn!("{} events dropped on a full queue", events::EVENTS.dropped());
    }

    Ok(())
}
