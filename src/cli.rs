use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{CountDirection, SourceKind};
use crate::logging::LogArgs;

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable timing and range summary
    Text,
    /// Full report as TOML
    Toml,
    /// Raw records with per-sample time differences
    Csv,
    /// Frequency plot drawn as terminal text
    Plot,
}

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Number of samples to capture (2-100000)
    #[arg(short = 'n', long)]
    pub samples: Option<usize>,

    /// Trigger rate in Hz (1-10000)
    #[arg(short = 'r', long)]
    pub rate: Option<u32>,

    /// Request SCHED_FIFO priority for the trigger thread
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub realtime: Option<bool>,

    /// Analog source to sample
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// IIO raw channel file for --source iio
    #[arg(long)]
    pub iio_path: Option<PathBuf>,

    /// Seed for the simulated ADC
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ClockArgs {
    /// Timestamp counter rate in Hz
    #[arg(long)]
    pub tick_hz: Option<u64>,

    /// Timestamp counter direction
    #[arg(long, value_enum)]
    pub direction: Option<CountDirection>,
}

#[derive(Debug, Parser)]
#[command(
    name = "adcjitter",
    about = "Capture timestamped ADC samples at a fixed rate and report jitter and value distribution"
)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Configuration file path (default: /etc/adcjitter.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub capture: CaptureArgs,

    #[command(flatten)]
    pub clock: ClockArgs,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Re-run the analysis on a capture previously written with --format csv
    Replay(ReplayArgs),
}

#[derive(Debug, Parser)]
pub struct ReplayArgs {
    /// CSV file with value and timestamp columns
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Configuration file path (default: /etc/adcjitter.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub clock: ClockArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["adcjitter"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Text));
        assert!(cli.capture.samples.is_none());
        assert!(cli.capture.realtime.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_capture_overrides() {
        let cli = Cli::try_parse_from([
            "adcjitter", "-n", "200", "-r", "50", "--realtime", "--source", "iio",
            "--direction", "up", "-f", "csv",
        ])
        .unwrap();
        assert_eq!(cli.capture.samples, Some(200));
        assert_eq!(cli.capture.rate, Some(50));
        assert_eq!(cli.capture.realtime, Some(true));
        assert_eq!(cli.capture.source, Some(SourceKind::Iio));
        assert_eq!(cli.clock.direction, Some(CountDirection::Up));
        assert!(matches!(cli.format, OutputFormat::Csv));
    }

    #[test]
    fn test_replay_subcommand() {
        let cli =
            Cli::try_parse_from(["adcjitter", "replay", "-i", "cap.csv", "--tick-hz", "16000000"])
                .unwrap();
        match cli.command {
            Some(Command::Replay(args)) => {
                assert_eq!(args.input, PathBuf::from("cap.csv"));
                assert_eq!(args.clock.tick_hz, Some(16_000_000));
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
