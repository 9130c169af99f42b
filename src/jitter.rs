use serde::Serialize;

use crate::acquire::session::CompletedCapture;
use crate::config::CountDirection;

/// Inter-sample timing of a completed capture, in counter ticks.
#[derive(Debug, Clone, Serialize)]
pub struct TimingStats {
    #[serde(skip)]
    pub deltas: Vec<u32>,
    pub min_time_diff: u32,
    pub max_time_diff: u32,
    pub jitter: u32,
    pub mean_time_diff: f64,
}

/// Elapsed ticks between two consecutive timestamps.
pub fn elapsed(earlier: u32, later: u32, direction: CountDirection) -> u32 {
    match direction {
        CountDirection::Down => earlier.wrapping_sub(later),
        CountDirection::Up => later.wrapping_sub(earlier),
    }
}

/// Compute every consecutive time difference and the spread between the
/// smallest and largest. A perfectly regular trigger gives `jitter == 0`.
pub fn analyze(capture: &CompletedCapture, direction: CountDirection) -> TimingStats {
    let deltas: Vec<u32> = capture
        .records()
        .windows(2)
        .map(|pair| elapsed(pair[0].timestamp, pair[1].timestamp, direction))
        .collect();

    // A completed capture holds at least two records, so `deltas` is non-empty.
    let mut min_time_diff = u32::MAX;
    let mut max_time_diff = 0;
    let mut sum: u64 = 0;
    for &d in &deltas {
        min_time_diff = min_time_diff.min(d);
        max_time_diff = max_time_diff.max(d);
        sum += d as u64;
    }

    TimingStats {
        mean_time_diff: sum as f64 / deltas.len() as f64,
        min_time_diff,
        max_time_diff,
        jitter: max_time_diff - min_time_diff,
        deltas,
    }
}

/// Convert a tick count to microseconds at the given counter rate.
pub fn ticks_to_micros(ticks: f64, tick_hz: u64) -> f64 {
    ticks * 1_000_000.0 / tick_hz as f64
}
