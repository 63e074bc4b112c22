//! Boiler bridge — host simulator.
//!
//! Runs the real [`AppService`] against a simulated boiler so bus behaviour
//! can be explored without the bathroom hardware.
//!
//! ```text
//!  stdin script ──▶ AppService · RadioBridge ──▶ LogPublisher
//!                        │
//!                        ▼
//!                   SimBoiler (LDR · servo · clock)
//! ```
//!
//! Usage: `boilerbridge-sim [config.json] < script`
//!
//! | Script line         | Effect                                       |
//! |---------------------|----------------------------------------------|
//! | `<topic> <payload>` | deliver a bus message                        |
//! | `wait <ms>`         | advance the clock, polling every 10 ms       |
//! | `rx <code> <len>`   | the 433 MHz receiver heard a code            |
//! | `hand`              | someone pressed the boiler button by hand    |
//! | `break` / `fix`     | boiler stops / resumes reacting to the button|
//! | `# …`               | comment                                      |

use std::io::{self, BufRead};

use anyhow::{Context, Result, bail};
use boilerbridge::adapters::log_sink::LogPublisher;
use boilerbridge::adapters::sim::SimBoiler;
use boilerbridge::app::service::AppService;
use boilerbridge::config::SystemConfig;
use boilerbridge::error::Error;
use boilerbridge::radio::RadioBridge;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

/// Poll interval of the simulated main loop (milliseconds).
const POLL_MS: u32 = 10;

struct Sim {
    app: AppService,
    radio: RadioBridge,
    hw: SimBoiler,
    publisher: LogPublisher,
}

impl Sim {
    fn wait(&mut self, ms: u32) {
        let start = self.hw.now_ms();
        while self.hw.now_ms().wrapping_sub(start) < ms {
            self.app.tick(self.hw.now_ms(), &mut self.hw, &mut self.publisher);
            while let Some((code, length)) = self.radio.next_transmission() {
                info!("433 MHz tx code={} length={}", code, length);
            }
            self.hw.advance(POLL_MS);
        }
    }

    fn run_line(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match head {
            "wait" => {
                let ms = rest.parse::<u32>().with_context(|| format!("bad wait duration {rest:?}"))?;
                self.wait(ms);
            }
            "rx" => {
                let Some((code, length)) = rest.split_once(' ') else {
                    bail!("usage: rx <code> <length>");
                };
                let code = code.trim().parse::<u32>().context("bad rx code")?;
                let length = length.trim().parse::<u16>().context("bad rx length")?;
                self.radio
                    .receive(self.hw.now_ms(), code, length, &mut self.publisher);
            }
            "hand" => self.hw.toggle_by_hand(),
            "break" => self.hw.set_responsive(false),
            "fix" => self.hw.set_responsive(true),
            topic => {
                info!("SUB | {} = {}", topic, rest);
                if !self.radio.handle_message(topic, rest, &mut self.publisher) {
                    self.app.handle_message(topic, rest, &mut self.hw);
                }
            }
        }
        Ok(())
    }
}

fn load_config(path: &str) -> Result<SystemConfig> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    SystemConfig::from_json(&json)
        .map_err(Error::from)
        .with_context(|| format!("loading {path}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => SystemConfig::default(),
    };
    info!("boilerbridge-sim v{}", env!("CARGO_PKG_VERSION"));

    let mut sim = Sim {
        app: AppService::new(&config).context("invalid configuration")?,
        radio: RadioBridge::new(),
        hw: SimBoiler::new(false),
        publisher: LogPublisher::new(),
    };
    sim.app.start(&mut sim.hw, &mut sim.publisher);

    for (n, line) in io::stdin().lock().lines().enumerate() {
        let line = line.context("reading script")?;
        if let Err(e) = sim.run_line(&line) {
            warn!("line {}: {:#}", n + 1, e);
        }
    }

    if let Err(e) = sim.app.health() {
        warn!("controller halted: {}", e);
    }
    let controller = sim.app.controller();
    info!(
        "done at t={}ms: state={} hot_water={} presses={} quota_left={} published={}",
        sim.hw.now_ms(),
        controller.state(),
        sim.hw.hot_water(),
        sim.hw.presses(),
        controller.changes_remaining(),
        sim.publisher.published(),
    );
    Ok(())
}
