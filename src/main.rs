mod acquire;
mod cli;
mod config;
mod distribution;
mod error;
mod jitter;
mod logging;
mod output;
mod plot;
mod replay;
mod screen;

use std::path::Path;
use std::process;

use clap::Parser;

use acquire::clock::MonotonicClock;
use acquire::session::CompletedCapture;
use acquire::trigger::TriggerStats;
use cli::{CaptureArgs, ClockArgs, Cli, Command, OutputFormat, ReplayArgs};
use config::{Config, CountDirection};
use error::Error;
use logging::LogLevel;
use plot::PlotGeometry;

/// Build a Config by layering: defaults → TOML file → CLI overrides.
fn build_config(
    config_file: Option<&Path>,
    capture_args: Option<&CaptureArgs>,
    clock_args: &ClockArgs,
) -> Config {
    let mut cfg = match config::load_config(config_file) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{}", e);
            Config::default()
        }
    };

    // Apply CLI overrides (only if explicitly set)
    if let Some(args) = capture_args {
        if let Some(v) = args.samples {
            cfg.capture.samples = v;
        }
        if let Some(v) = args.rate {
            cfg.capture.rate_hz = v;
        }
        if let Some(v) = args.realtime {
            cfg.capture.realtime = v;
        }
        if let Some(v) = args.source {
            cfg.source.kind = v;
        }
        if let Some(ref v) = args.iio_path {
            cfg.source.iio_path = v.clone();
        }
        if let Some(v) = args.seed {
            cfg.source.seed = v;
        }
    }
    if let Some(v) = clock_args.tick_hz {
        cfg.clock.tick_hz = v;
    }
    if let Some(v) = clock_args.direction {
        cfg.clock.direction = v;
    }

    cfg.validate();
    cfg
}

/// How the timestamps of a capture are to be read.
struct Counter {
    direction: CountDirection,
    tick_hz: u64,
}

fn analyze_and_write(
    capture: &CompletedCapture,
    counter: &Counter,
    cfg: &Config,
    rate_hz: Option<u32>,
    trigger: Option<TriggerStats>,
    format: &OutputFormat,
    output_file: Option<&Path>,
) -> Result<(), Error> {
    let timing = jitter::analyze(capture, counter.direction);
    let distribution = distribution::build(capture);
    log::info!(
        "jitter {} ticks (min {} max {}), ADC {}..={}",
        timing.jitter,
        timing.min_time_diff,
        timing.max_time_diff,
        distribution.min_value,
        distribution.max_value,
    );

    let analysis = output::Analysis {
        capture,
        timing: &timing,
        distribution: &distribution,
        direction: counter.direction,
        tick_hz: counter.tick_hz,
        rate_hz,
        trigger,
        geometry: PlotGeometry::from(&cfg.plot),
    };
    output::write_output(&analysis, format, output_file)?;
    Ok(())
}

fn run_capture(cli: &Cli, cfg: &Config) -> Result<(), Error> {
    let source = acquire::source::open(&cfg.source)?;
    let clock = MonotonicClock::new(&cfg.clock);
    let acquisition = acquire::run(&cfg.capture, source, clock)?;
    let counter = Counter {
        direction: acquisition.direction,
        tick_hz: acquisition.tick_hz,
    };
    analyze_and_write(
        &acquisition.capture,
        &counter,
        cfg,
        Some(cfg.capture.rate_hz),
        Some(acquisition.trigger_stats),
        &cli.format,
        cli.output_file.as_deref(),
    )
}

/// Analyze an exported capture. Flags given on the command line win over
/// the settings recorded in the file, which win over the config.
fn run_replay(args: &ReplayArgs, cfg: &Config) -> Result<(), Error> {
    let exported = replay::read_capture(&args.input)?;
    let direction = exported.resolve_direction(args.clock.direction, cfg.clock.direction)?;

    let mut cfg = cfg.clone();
    if let (None, Some(hz)) = (args.clock.tick_hz, exported.tick_hz) {
        cfg.clock.tick_hz = hz;
        cfg.validate();
    }
    let counter = Counter {
        direction,
        tick_hz: cfg.clock.tick_hz,
    };
    log::debug!(
        "replaying {} samples, {}-counting clock at {}Hz",
        exported.capture.len(),
        direction.as_str(),
        counter.tick_hz
    );

    analyze_and_write(
        &exported.capture,
        &counter,
        &cfg,
        None,
        None,
        &args.format,
        args.output_file.as_deref(),
    )
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Command::Replay(args)) => {
            logging::init(&args.log, LogLevel::Warn);
            let cfg = build_config(args.config_file.as_deref(), None, &args.clock);
            run_replay(args, &cfg)
        }
        None => {
            logging::init(&cli.log, LogLevel::Info);
            let cfg = build_config(cli.config_file.as_deref(), Some(&cli.capture), &cli.clock);
            run_capture(&cli, &cfg)
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        process::exit(1);
    }
}
