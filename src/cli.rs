// ABOUTME: Shared CLI argument parsing and clock builder utilities
// ABOUTME: Consolidates common code between the timewarp binaries (main.rs, panel.rs)

use crate::clock::VirtualClock;
use crate::config::ClockConfig;
use crate::error::Error;
use chrono::{Local, TimeZone};
use clap::Args;
use std::path::PathBuf;

/// Common clock arguments shared between all binaries
///
/// Use with `#[command(flatten)]` in your binary's Args struct:
/// ```ignore
/// #[derive(Parser)]
/// struct MyArgs {
///     #[command(flatten)]
///     clock: ClockArgs,
///
///     // Binary-specific args here
/// }
/// ```
#[derive(Args, Debug, Clone)]
pub struct ClockArgs {
    /// Directory holding the persisted calibration (defaults to <tmp>/timewarp)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Storage key of the calibration record
    #[arg(long, global = true, default_value = "timewarp-state")]
    pub key: String,

    /// Display refresh interval in milliseconds
    #[arg(long, global = true, default_value = "1000")]
    pub refresh_ms: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl ClockArgs {
    /// Initialize tracing based on verbosity flag
    pub fn init_tracing(&self) {
        self.init_tracing_with("timewarp=info");
    }

    /// Initialize tracing, using `quiet_filter` unless verbose or `RUST_LOG` is set
    pub fn init_tracing_with(&self, quiet_filter: &str) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let filter = if self.verbose {
            "timewarp=debug"
        } else {
            quiet_filter
        };

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Build ClockConfig from these args
    pub fn build_config(&self) -> ClockConfig {
        let config = match &self.state_dir {
            Some(dir) => ClockConfig::new(dir.clone()),
            None => ClockConfig::default(),
        };
        config
            .storage_key(self.key.clone())
            .refresh_interval_ms(self.refresh_ms)
    }

    /// Open the persisted clock described by these args
    pub fn open_clock(&self) -> (ClockConfig, VirtualClock) {
        let config = self.build_config();
        tracing::debug!(
            "Calibration store: {}/{}.json",
            config.state_dir.display(),
            config.storage_key
        );
        let clock = VirtualClock::open(&config);
        (config, clock)
    }
}

/// Shift unit suffixes, longest first so `ms` wins over `s`
const SHIFT_UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
    ("d", 86_400_000.0),
];

/// Parse a signed duration like `90`, `-15m`, `+1.5h` or `2d` into milliseconds
///
/// A bare number is milliseconds.
pub fn parse_shift(input: &str) -> crate::Result<f64> {
    let text = input.trim();
    let (number, scale) = SHIFT_UNITS
        .iter()
        .find_map(|&(unit, scale)| text.strip_suffix(unit).map(|number| (number, scale)))
        .unwrap_or((text, 1.0));

    let value: f64 = number
        .parse()
        .map_err(|_| Error::InvalidTime(format!("cannot parse shift {input:?}")))?;
    let delta = value * scale;
    if !delta.is_finite() {
        return Err(Error::InvalidTime(format!("shift {input:?} is out of range")));
    }
    Ok(delta)
}

/// Format epoch milliseconds as a local date-time
pub fn format_timestamp(ms: f64) -> String {
    match Local.timestamp_millis_opt(ms.floor() as i64).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f %Z").to_string(),
        None => format!("{ms} ms (out of range)"),
    }
}

/// Format an offset in milliseconds as `+1d 02:03:04`
pub fn format_offset(ms: f64) -> String {
    let sign = if ms < 0.0 { '-' } else { '+' };
    let total_secs = (ms.abs() / 1000.0).round() as u64;
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{sign}{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ClockArgs {
        ClockArgs {
            state_dir: None,
            key: "timewarp-state".to_string(),
            refresh_ms: 1000,
            verbose: false,
        }
    }

    #[test]
    fn test_build_config_defaults() {
        let config = args().build_config();
        assert_eq!(config.storage_key, "timewarp-state");
        assert_eq!(config.refresh_interval_ms, 1000);
        assert_eq!(config.state_dir, ClockConfig::default().state_dir);
    }

    #[test]
    fn test_build_config_overrides() {
        let args = ClockArgs {
            state_dir: Some(PathBuf::from("/var/lib/tw")),
            key: "demo".to_string(),
            refresh_ms: 200,
            verbose: true,
        };

        let config = args.build_config();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/tw"));
        assert_eq!(config.storage_key, "demo");
        assert_eq!(config.refresh_interval_ms, 200);
    }

    #[test]
    fn test_parse_shift() {
        assert_eq!(parse_shift("250").unwrap(), 250.0);
        assert_eq!(parse_shift("-250ms").unwrap(), -250.0);
        assert_eq!(parse_shift("+30s").unwrap(), 30_000.0);
        assert_eq!(parse_shift("-15m").unwrap(), -900_000.0);
        assert_eq!(parse_shift("1.5h").unwrap(), 5_400_000.0);
        assert_eq!(parse_shift("2d").unwrap(), 172_800_000.0);
    }

    #[test]
    fn test_parse_shift_scientific_notation() {
        assert_eq!(parse_shift("1e3").unwrap(), 1_000.0);
        assert_eq!(parse_shift("-2.5e4ms").unwrap(), -25_000.0);
        assert_eq!(parse_shift("1.5E2s").unwrap(), 150_000.0);
    }

    #[test]
    fn test_parse_shift_rejects_garbage() {
        for input in ["", "h", "10w", "ten", "--5", "5 m", "inf", "NaNs"] {
            assert!(parse_shift(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn test_parse_shift_rejects_overflow() {
        let err = parse_shift("1e308d").unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0.0), "+00:00:00");
        assert_eq!(format_offset(3_723_000.0), "+01:02:03");
        assert_eq!(format_offset(-90_000.0), "-00:01:30");
        assert_eq!(format_offset(90_061_000.0), "+1d 01:01:01");
    }
}
