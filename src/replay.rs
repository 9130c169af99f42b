use std::fs;
use std::path::Path;

use crate::acquire::session::{CompletedCapture, SampleRecord};
use crate::config::CountDirection;
use crate::error::Error;
use crate::jitter;

/// A capture read back from an export, plus what the file says about the
/// counter that stamped it.
#[derive(Debug)]
pub struct Replay {
    pub capture: CompletedCapture,
    pub direction: Option<CountDirection>,
    pub tick_hz: Option<u64>,
    deltas: Vec<RecordedDelta>,
}

/// A `delta` cell: the elapsed ticks from record `index` to the next one.
#[derive(Debug, Clone, Copy)]
struct RecordedDelta {
    index: usize,
    line_no: usize,
    ticks: u32,
}

impl Replay {
    /// Choose how to read the timestamps.
    ///
    /// An explicit choice wins, then the file's `# direction=` line, then
    /// whichever direction reproduces the `delta` column, then `fallback`.
    /// Whatever is chosen must agree with the `delta` column.
    pub fn resolve_direction(
        &self,
        explicit: Option<CountDirection>,
        fallback: CountDirection,
    ) -> Result<CountDirection, Error> {
        let direction = match explicit.or(self.direction) {
            Some(d) => d,
            None if self.mismatch(fallback).is_none() => fallback,
            None => match [CountDirection::Down, CountDirection::Up]
                .into_iter()
                .find(|&d| self.mismatch(d).is_none())
            {
                Some(d) => {
                    log::info!("delta column matches a {}-counting clock", d.as_str());
                    d
                }
                None => fallback,
            },
        };

        match self.mismatch(direction) {
            None => Ok(direction),
            Some(d) => Err(Error::InvalidArgs(format!(
                "line {}: delta {} does not match {}-counting timestamps",
                d.line_no,
                d.ticks,
                direction.as_str()
            ))),
        }
    }

    /// First recorded delta the timestamps disagree with.
    fn mismatch(&self, direction: CountDirection) -> Option<RecordedDelta> {
        let records = self.capture.records();
        self.deltas.iter().copied().find(|d| {
            match (records.get(d.index), records.get(d.index + 1)) {
                (Some(a), Some(b)) => jitter::elapsed(a.timestamp, b.timestamp, direction) != d.ticks,
                _ => true,
            }
        })
    }
}

/// Load a capture exported with `--format csv`.
pub fn read_capture(path: &Path) -> Result<Replay, Error> {
    let text = fs::read_to_string(path).map_err(|e| {
        Error::InvalidArgs(format!("failed to read capture {}: {}", path.display(), e))
    })?;
    parse_capture(&text)
}

/// Parse CSV text with a header naming at least `value` and `timestamp`.
///
/// Lines starting with `#` carry `key=value` settings (`direction`,
/// `tick_hz`); unknown keys are ignored. An optional `delta` column is kept
/// for cross-checking. Other columns are ignored; blank lines are skipped.
pub fn parse_capture(text: &str) -> Result<Replay, Error> {
    let mut direction = None;
    let mut tick_hz = None;
    let mut rows = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(setting) = line.strip_prefix('#') else {
            rows.push((line_no, line));
            continue;
        };
        let Some((key, value)) = setting.split_once('=') else {
            continue;
        };
        match key.trim() {
            "direction" => {
                direction = Some(CountDirection::parse(value).ok_or_else(|| {
                    Error::InvalidArgs(format!("line {}: invalid direction {:?}", line_no, value.trim()))
                })?);
            }
            "tick_hz" => {
                tick_hz = Some(value.trim().parse::<u64>().map_err(|_| {
                    Error::InvalidArgs(format!("line {}: invalid tick_hz {:?}", line_no, value.trim()))
                })?);
            }
            _ => {}
        }
    }

    let mut rows = rows.into_iter();
    let (_, header) = rows
        .next()
        .ok_or_else(|| Error::InvalidArgs("capture file is empty".into()))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let position = |name: &str| columns.iter().position(|c| c.eq_ignore_ascii_case(name));
    let column = |name: &str| {
        position(name)
            .ok_or_else(|| Error::InvalidArgs(format!("capture header has no '{}' column", name)))
    };
    let value_col = column("value")?;
    let timestamp_col = column("timestamp")?;
    let delta_col = position("delta");

    let mut records = Vec::new();
    let mut deltas = Vec::new();
    for (line_no, line) in rows {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let raw = |col: usize| fields.get(col).copied().unwrap_or("");
        let field = |col: usize, name: &str| -> Result<u32, Error> {
            raw(col).parse::<u32>().map_err(|_| {
                Error::InvalidArgs(format!("line {}: invalid {} {:?}", line_no, name, raw(col)))
            })
        };
        if let Some(col) = delta_col {
            if !raw(col).is_empty() {
                deltas.push(RecordedDelta {
                    index: records.len(),
                    line_no,
                    ticks: field(col, "delta")?,
                });
            }
        }
        records.push(SampleRecord {
            value: field(value_col, "value")?,
            timestamp: field(timestamp_col, "timestamp")?,
        });
    }

    Ok(Replay {
        capture: CompletedCapture::from_records(records)?,
        direction,
        tick_hz,
        deltas,
    })
}
