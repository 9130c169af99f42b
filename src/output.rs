use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::acquire::session::CompletedCapture;
use crate::acquire::trigger::TriggerStats;
use crate::cli::OutputFormat;
use crate::config::CountDirection;
use crate::distribution::{Distribution, ValueCount};
use crate::jitter::{self, TimingStats};
use crate::plot::{self, PlotGeometry};
use crate::screen::TextScreen;

/// Everything one analysis run produced, ready to be written out.
pub struct Analysis<'a> {
    pub capture: &'a CompletedCapture,
    pub timing: &'a TimingStats,
    pub distribution: &'a Distribution,
    pub direction: CountDirection,
    pub tick_hz: u64,
    pub rate_hz: Option<u32>,
    pub trigger: Option<TriggerStats>,
    pub geometry: PlotGeometry,
}

#[derive(Serialize)]
struct Report<'a> {
    samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_hz: Option<u32>,
    tick_hz: u64,
    direction: CountDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    overruns: Option<u64>,
    timing: TimingReport<'a>,
    values: ValueReport,
    distribution: &'a [ValueCount],
}

#[derive(Serialize)]
struct TimingReport<'a> {
    #[serde(flatten)]
    ticks: &'a TimingStats,
    min_us: f64,
    max_us: f64,
    jitter_us: f64,
}

#[derive(Serialize)]
struct ValueReport {
    min: u32,
    max: u32,
    distinct: usize,
}

/// Writes the analysis to stdout or a file in the specified format.
pub fn write_output(
    analysis: &Analysis<'_>,
    format: &OutputFormat,
    output_file: Option<&Path>,
) -> io::Result<()> {
    match output_file {
        Some(path) => {
            let f = File::create(path)?;
            let mut out = BufWriter::new(f);
            format_output(analysis, format, &mut out)?;
            out.flush()
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            format_output(analysis, format, &mut out)?;
            out.flush()
        }
    }
}

fn format_output(analysis: &Analysis<'_>, format: &OutputFormat, out: &mut dyn Write) -> io::Result<()> {
    match format {
        OutputFormat::Text => write_text(analysis, out),
        OutputFormat::Toml => write_toml(analysis, out),
        OutputFormat::Csv => write_csv(analysis, out),
        OutputFormat::Plot => {
            let mut screen = TextScreen::new();
            plot::render(&mut screen, analysis.timing, analysis.distribution, &analysis.geometry);
            out.write_all(screen.render().as_bytes())
        }
    }
}

fn write_text(a: &Analysis<'_>, out: &mut dyn Write) -> io::Result<()> {
    let t = a.timing;
    let us = |ticks: f64| jitter::ticks_to_micros(ticks, a.tick_hz);

    match a.rate_hz {
        Some(rate) => writeln!(out, "Samples:        {} @ {} Hz", a.capture.len(), rate)?,
        None => writeln!(out, "Samples:        {}", a.capture.len())?,
    }
    writeln!(out, "Clock:          {} Hz, counting {}", a.tick_hz, a.direction.as_str())?;
    writeln!(
        out,
        "Min time diff:  {} ticks ({:.3} us)",
        t.min_time_diff,
        us(t.min_time_diff as f64)
    )?;
    writeln!(
        out,
        "Max time diff:  {} ticks ({:.3} us)",
        t.max_time_diff,
        us(t.max_time_diff as f64)
    )?;
    writeln!(
        out,
        "Mean time diff: {:.1} ticks ({:.3} us)",
        t.mean_time_diff,
        us(t.mean_time_diff)
    )?;
    writeln!(out, "Jitter:         {} ticks ({:.3} us)", t.jitter, us(t.jitter as f64))?;
    writeln!(
        out,
        "ADC range:      {}..={} ({} distinct values)",
        a.distribution.min_value,
        a.distribution.max_value,
        a.distribution.len()
    )?;
    if let Some(mode) = a.distribution.mode() {
        writeln!(
            out,
            "Most frequent:  {} (p={:.3})",
            mode.value,
            a.distribution.probability(mode.value)
        )?;
    }
    if let Some(stats) = a.trigger {
        writeln!(out, "Overruns:       {}", stats.overruns)?;
    }
    Ok(())
}

fn write_toml(a: &Analysis<'_>, out: &mut dyn Write) -> io::Result<()> {
    let t = a.timing;
    let report = Report {
        samples: a.capture.len(),
        rate_hz: a.rate_hz,
        tick_hz: a.tick_hz,
        direction: a.direction,
        overruns: a.trigger.map(|s| s.overruns),
        timing: TimingReport {
            ticks: t,
            min_us: jitter::ticks_to_micros(t.min_time_diff as f64, a.tick_hz),
            max_us: jitter::ticks_to_micros(t.max_time_diff as f64, a.tick_hz),
            jitter_us: jitter::ticks_to_micros(t.jitter as f64, a.tick_hz),
        },
        values: ValueReport {
            min: a.distribution.min_value,
            max: a.distribution.max_value,
            distinct: a.distribution.len(),
        },
        distribution: &a.distribution.entries,
    };
    let text = toml::to_string(&report).map_err(io::Error::other)?;
    out.write_all(text.as_bytes())
}

/// One row per record; `delta` is the elapsed ticks to the next record.
///
/// The counter settings go in leading `#` lines so a replay reads the
/// timestamps the same way the capture did.
fn write_csv(a: &Analysis<'_>, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "# direction={}", a.direction.as_str())?;
    writeln!(out, "# tick_hz={}", a.tick_hz)?;
    writeln!(out, "index,value,timestamp,delta")?;
    for (i, record) in a.capture.records().iter().enumerate() {
        match a.timing.deltas.get(i) {
            Some(delta) => writeln!(out, "{},{},{},{}", i, record.value, record.timestamp, delta)?,
            None => writeln!(out, "{},{},{},", i, record.value, record.timestamp)?,
        }
    }
    Ok(())
}
