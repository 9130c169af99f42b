use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which way the timestamp counter moves between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CountDirection {
    Up,
    Down,
}

impl CountDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountDirection::Up => "up",
            CountDirection::Down => "down",
        }
    }

    /// Parse the name written by `as_str`, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Some(CountDirection::Up),
            "down" => Some(CountDirection::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Simulated,
    Iio,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub samples: usize,
    pub rate_hz: u32,
    pub realtime: bool,
    pub spin_margin_us: u64,
    pub poll_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            rate_hz: 100,
            realtime: false,
            spin_margin_us: 200,
            poll_interval_ms: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub tick_hz: u64,
    pub direction: CountDirection,
    pub reload: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_hz: 80_000_000,
            direction: CountDirection::Down,
            reload: 0xFFFF_FFFE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub iio_path: PathBuf,
    pub midpoint: u32,
    pub noise: u32,
    pub seed: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Simulated,
            iio_path: PathBuf::from("/sys/bus/iio/devices/iio:device0/in_voltage0_raw"),
            midpoint: 2048,
            noise: 4,
            seed: 0x5EED,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub left: u32,
    pub span: u32,
    pub baseline: u32,
    pub max_height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            left: 5,
            span: 117,
            baseline: 158,
            max_height: 127,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub clock: ClockConfig,
    pub source: SourceConfig,
    pub plot: PlotConfig,
}

impl Config {
    /// Clamp fields to valid ranges.
    pub fn validate(&mut self) {
        self.capture.samples = self.capture.samples.clamp(2, 100_000);
        self.capture.rate_hz = self.capture.rate_hz.clamp(1, 10_000);
        self.capture.spin_margin_us = self.capture.spin_margin_us.clamp(0, 5_000);
        self.capture.poll_interval_ms = self.capture.poll_interval_ms.clamp(1, 1_000);
        self.clock.tick_hz = self.clock.tick_hz.clamp(1_000, 1_000_000_000);
        self.source.midpoint = self.source.midpoint.clamp(0, 4095);
        self.source.noise = self.source.noise.clamp(0, 2048);
        // The bars must stay on a 128x160 panel.
        self.plot.left = self.plot.left.min(127);
        self.plot.span = self.plot.span.min(127 - self.plot.left);
        self.plot.baseline = self.plot.baseline.clamp(1, 159);
        self.plot.max_height = self.plot.max_height.min(self.plot.baseline);
    }
}

/// Load configuration from a TOML file.
///
/// - If `explicit_path` is `Some` and the file is missing, returns an error.
/// - If `explicit_path` is `None`, tries `/etc/adcjitter.toml`; if missing, returns defaults.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, Error> {
    let path = match explicit_path {
        Some(p) => {
            if !p.exists() {
                return Err(Error::InvalidArgs(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => {
            let default = Path::new("/etc/adcjitter.toml");
            if !default.exists() {
                return Ok(Config::default());
            }
            default.to_path_buf()
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        Error::InvalidArgs(format!("failed to read config {}: {}", path.display(), e))
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| {
        Error::InvalidArgs(format!("failed to parse config {}: {}", path.display(), e))
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.capture.samples, 1000);
        assert_eq!(cfg.capture.rate_hz, 100);
        assert!(!cfg.capture.realtime);
        assert_eq!(cfg.clock.tick_hz, 80_000_000);
        assert_eq!(cfg.clock.direction, CountDirection::Down);
        assert_eq!(cfg.clock.reload, 0xFFFF_FFFE);
        assert_eq!(cfg.source.kind, SourceKind::Simulated);
        assert_eq!(cfg.source.midpoint, 2048);
        assert_eq!(cfg.plot.left, 5);
        assert_eq!(cfg.plot.span, 117);
        assert_eq!(cfg.plot.baseline, 158);
        assert_eq!(cfg.plot.max_height, 127);
    }

    #[test]
    fn test_direction_names() {
        for d in [CountDirection::Up, CountDirection::Down] {
            assert_eq!(CountDirection::parse(d.as_str()), Some(d));
        }
        assert_eq!(CountDirection::parse(" UP "), Some(CountDirection::Up));
        assert_eq!(CountDirection::parse("sideways"), None);
    }

    #[test]
    fn test_validate_clamps_high() {
        let mut cfg = Config::default();
        cfg.capture.samples = 1_000_000;
        cfg.capture.rate_hz = 50_000;
        cfg.capture.spin_margin_us = 10_000;
        cfg.clock.tick_hz = 10_000_000_000;
        cfg.source.midpoint = 9000;
        cfg.source.noise = 5000;
        cfg.plot.left = 200;
        cfg.plot.baseline = 400;
        cfg.validate();
        assert_eq!(cfg.capture.samples, 100_000);
        assert_eq!(cfg.capture.rate_hz, 10_000);
        assert_eq!(cfg.capture.spin_margin_us, 5_000);
        assert_eq!(cfg.clock.tick_hz, 1_000_000_000);
        assert_eq!(cfg.source.midpoint, 4095);
        assert_eq!(cfg.source.noise, 2048);
        assert_eq!(cfg.plot.left, 127);
        assert_eq!(cfg.plot.span, 0);
        assert_eq!(cfg.plot.baseline, 159);
    }

    #[test]
    fn test_validate_clamps_low() {
        let mut cfg = Config::default();
        cfg.capture.samples = 0;
        cfg.capture.rate_hz = 0;
        cfg.capture.poll_interval_ms = 0;
        cfg.clock.tick_hz = 1;
        cfg.plot.baseline = 0;
        cfg.validate();
        assert_eq!(cfg.capture.samples, 2);
        assert_eq!(cfg.capture.rate_hz, 1);
        assert_eq!(cfg.capture.poll_interval_ms, 1);
        assert_eq!(cfg.clock.tick_hz, 1_000);
        assert_eq!(cfg.plot.baseline, 1);
        assert_eq!(cfg.plot.max_height, 1);
    }

    #[test]
    fn test_toml_parsing() {
        let dir = std::env::temp_dir();
        let path = dir.join("adcjitter_test_config.toml");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write!(
                f,
                r#"
[capture]
samples = 500
rate_hz = 250

[clock]
direction = "up"

[source]
kind = "iio"
iio_path = "/tmp/in_voltage3_raw"
"#
            )
            .unwrap();
        }
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.capture.samples, 500);
        assert_eq!(config.capture.rate_hz, 250);
        assert_eq!(config.clock.direction, CountDirection::Up);
        assert_eq!(config.source.kind, SourceKind::Iio);
        assert_eq!(config.source.iio_path, PathBuf::from("/tmp/in_voltage3_raw"));
        // Unset fields should get defaults
        assert_eq!(config.clock.tick_hz, 80_000_000);
        assert_eq!(config.plot.span, 117);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_explicit_config_errors() {
        let path = std::path::Path::new("/tmp/adcjitter_nonexistent_config.toml");
        let result = load_config(Some(path));
        assert!(result.is_err());
    }
}
