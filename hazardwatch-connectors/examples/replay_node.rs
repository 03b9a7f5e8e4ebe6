//! Run a HazardWatch node on the host against recorded snapshots
//!
//! ```text
//! cargo run --example replay_node -- [--realtime] [snapshots.log] [config.json] [out-dir]
//! ```
//!
//! Without arguments a short built-in recording is replayed: a quiet start,
//! a flood, a gas spike and a tilt. The status screen goes to stdout, alerts
//! and snapshots to `<out-dir>/alerts.log` and `<out-dir>/snapshots.log`,
//! everything the node would radio out to `<out-dir>/outbox.log`, and the
//! GSM modem's AT commands to `<out-dir>/modem.log`.
//!
//! By default the recording runs on simulated time, as fast as it can.
//! `--realtime` paces it on the host clock instead. Set `RUST_LOG` to change
//! the log level (default `info`).

use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use hazardwatch_connectors::{
    load_config, serial::SerialLink, storage::JsonLinesLog, ConnectorNotifier, GsmModem, ReplaySampler, TextDisplay,
};
use hazardwatch_core::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main loop period
const STEP_MS: u64 = 50;

const DEMO: &str = r#"{"time":0,"soil":1800.0,"gas":900.0,"temp":24.5,"hum":61.0,"ax":0.1,"ay":0.1,"az":9.8,"tilt":false,"lat":31.1,"lng":77.2}
{"time":100,"soil":1750.0,"gas":950.0,"temp":24.6,"hum":61.0,"ax":0.1,"ay":0.1,"az":9.8,"tilt":false,"lat":31.1,"lng":77.2}
{"time":200,"soil":1200.0,"gas":1000.0,"temp":24.6,"hum":62.0,"ax":0.1,"ay":0.1,"az":9.8,"tilt":false,"lat":31.1,"lng":77.2}
{"time":300,"soil":1150.0,"gas":2900.0,"temp":25.0,"hum":62.0,"ax":0.1,"ay":0.1,"az":9.8,"tilt":false,"lat":31.1,"lng":77.2}
{"time":400,"soil":1150.0,"gas":3100.0,"temp":25.1,"hum":62.0,"ax":0.1,"ay":0.1,"az":9.8,"tilt":true,"lat":31.1,"lng":77.2}
"#;

/// Buzzer pin that only logs its level
struct LoggedPin;

impl BuzzerPin for LoggedPin {
    fn set_level(&mut self, on: bool) -> SinkResult {
        log::info!("buzzer {}", if on { "on" } else { "off" });
        Ok(())
    }
}

/// Loop clock: simulated for fast replay, or the host's monotonic clock
enum Pace {
    Simulated(MockTimeSource),
    RealTime(MonotonicClock),
}

impl Pace {
    fn now(&self) -> Timestamp {
        match self {
            Pace::Simulated(clock) => clock.now(),
            Pace::RealTime(clock) => clock.now(),
        }
    }

    fn step(&mut self) {
        match self {
            Pace::Simulated(clock) => clock.advance(STEP_MS),
            Pace::RealTime(_) => thread::sleep(Duration::from_millis(STEP_MS)),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let realtime = env::args().skip(1).any(|arg| arg == "--realtime");
    let args: Vec<String> = env::args().skip(1).filter(|arg| !arg.starts_with("--")).collect();
    let input: Box<dyn BufRead> = match args.first() {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(Cursor::new(DEMO)),
    };
    let config = match args.get(1) {
        Some(path) => load_config(path)?,
        None => AlertConfig::default(),
    };
    let out_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("hazardwatch-replay"));

    let event_log = JsonLinesLog::open(&out_dir)?;
    let outbox = File::create(out_dir.join("outbox.log"))?;
    let modem = GsmModem::new(File::create(out_dir.join("modem.log"))?, "112")?.with_call_duration(1500);
    let sinks = Sinks::new(
        TextDisplay::new(io::stdout()),
        ScheduledBuzzer::new(LoggedPin),
        event_log,
        ConnectorNotifier::new(SerialLink::new(outbox), "hazardwatch/replay"),
    )
    .with_emergency(modem);
    let mut engine = Engine::new(config, sinks)?;
    let mut sampler = ReplaySampler::new(input);

    let mut clock = if realtime {
        Pace::RealTime(MonotonicClock::new())
    } else {
        Pace::Simulated(MockTimeSource::new(0))
    };
    engine.sync_wall_clock(&SystemClock, clock.now());

    while !sampler.is_exhausted() {
        let now = clock.now();
        if let Some(report) = engine.tick(&mut sampler, now) {
            for kind in report.admitted_kinds() {
                log::info!("t={} admitted {}", now, kind);
            }
        }
        clock.step();
    }

    // Let the last buzzer pattern and emergency call finish
    let stop = clock.now() + 2000;
    while clock.now() <= stop {
        engine.tick(&mut sampler, clock.now());
        clock.step();
    }

    engine.handle_command(Command::GetAnalytics, clock.now());

    let stats = sampler.stats();
    log::info!(
        "replayed {} records ({} bad lines), {} alerts admitted, {} suppressed",
        stats.records_read,
        stats.parse_errors,
        engine.limiter().admitted_count(),
        engine.limiter().suppressed_count()
    );
    log::info!("logs written to {}", out_dir.display());
    Ok(())
}
