use crate::config::PlotConfig;
use crate::distribution::Distribution;
use crate::jitter::TimingStats;
use crate::screen::Screen;

/// Where the frequency plot sits on the panel, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotGeometry {
    pub left: u32,
    pub span: u32,
    pub baseline: u32,
    pub max_height: u32,
}

impl From<&PlotConfig> for PlotGeometry {
    fn from(config: &PlotConfig) -> Self {
        Self {
            left: config.left,
            span: config.span,
            baseline: config.baseline,
            max_height: config.max_height,
        }
    }
}

impl Default for PlotGeometry {
    fn default() -> Self {
        Self::from(&PlotConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    pub x: u32,
    pub y_top: u32,
    pub height: u32,
}

/// Lay out one vertical bar per distribution entry.
///
/// `x` is proportional to the value's position within the observed range
/// and `height` to its count relative to the most frequent value. When all
/// samples share one value every bar is centered.
pub fn bars(dist: &Distribution, geom: &PlotGeometry) -> Vec<Bar> {
    let range = (dist.max_value - dist.min_value) as u64;
    let max_count = dist.max_count().max(1) as u64;

    dist.entries
        .iter()
        .map(|entry| {
            let offset = if range == 0 {
                geom.span / 2
            } else {
                (geom.span as u64 * (entry.value - dist.min_value) as u64 / range) as u32
            };
            let height = (geom.max_height as u64 * entry.count as u64 / max_count) as u32;
            Bar {
                x: geom.left + offset,
                y_top: geom.baseline.saturating_sub(height),
                height,
            }
        })
        .collect()
}

/// Draw the frequency plot followed by the range and jitter readouts.
pub fn render<S: Screen>(
    screen: &mut S,
    timing: &TimingStats,
    dist: &Distribution,
    geom: &PlotGeometry,
) {
    screen.clear();
    screen.set_cursor(0, 0);
    for bar in bars(dist, geom) {
        screen.draw_vertical_bar(bar.x, bar.y_top, bar.height);
    }

    screen.set_cursor(1, 1);
    screen.write_text("Min ADC: ");
    screen.write_number(dist.min_value as u64);
    screen.set_cursor(1, 2);
    screen.write_text("Max ADC: ");
    screen.write_number(dist.max_value as u64);
    screen.set_cursor(1, 3);
    screen.write_text("Jitter: ");
    screen.write_number(timing.jitter as u64);
}
