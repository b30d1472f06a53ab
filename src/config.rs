// ABOUTME: Clock configuration
// ABOUTME: Defines where the calibration is stored and how front ends drive the clock

use std::path::PathBuf;

/// Clock configuration
#[derive(Clone, Debug)]
pub struct ClockConfig {
    /// Directory holding the persisted calibration
    pub state_dir: PathBuf,
    /// Key the calibration is stored under
    pub storage_key: String,
    /// Display refresh interval in milliseconds
    pub refresh_interval_ms: u64,
    /// Jump size for the panel's shift keys, in milliseconds
    pub shift_step_ms: f64,
    /// Speeds the panel steps through, ascending
    pub speed_presets: Vec<f64>,
}

impl ClockConfig {
    /// Create a configuration storing its state under `state_dir`
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            ..Default::default()
        }
    }

    /// Set the storage key
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the display refresh interval in milliseconds
    pub fn refresh_interval_ms(mut self, ms: u64) -> Self {
        self.refresh_interval_ms = ms;
        self
    }

    /// Set the panel shift step in milliseconds
    pub fn shift_step_ms(mut self, ms: f64) -> Self {
        self.shift_step_ms = ms;
        self
    }

    /// Set the speed presets; non-positive entries are dropped
    pub fn speed_presets(mut self, presets: impl IntoIterator<Item = f64>) -> Self {
        let mut presets: Vec<f64> = presets
            .into_iter()
            .filter(|s| s.is_finite() && *s > 0.0)
            .collect();
        presets.sort_by(f64::total_cmp);
        presets.dedup();
        if !presets.is_empty() {
            self.speed_presets = presets;
        }
        self
    }

    /// Next preset above `speed`, if any
    pub fn faster_than(&self, speed: f64) -> Option<f64> {
        self.speed_presets.iter().copied().find(|&p| p > speed)
    }

    /// Next preset below `speed`, if any
    pub fn slower_than(&self, speed: f64) -> Option<f64> {
        self.speed_presets.iter().rev().copied().find(|&p| p < speed)
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            state_dir: std::env::temp_dir().join("timewarp"),
            storage_key: "timewarp-state".to_string(),
            refresh_interval_ms: 1000,
            shift_step_ms: 3_600_000.0,
            speed_presets: vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 60.0],
        }
    }
}
