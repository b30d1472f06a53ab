// ABOUTME: Calibration triple mapping real time onto virtual time
// ABOUTME: Serialized as the persisted clock snapshot

use serde::{Deserialize, Serialize};

/// The calibration of a virtual clock
///
/// Between calibrations, virtual time is an affine function of real time:
/// `virtual = base_virtual_ms + (real - base_real_ms) * speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockState {
    /// Real instant (epoch ms) of the last calibration
    pub base_real_ms: f64,
    /// Virtual time (epoch ms) in effect at `base_real_ms`
    pub base_virtual_ms: f64,
    /// Virtual milliseconds per real millisecond
    pub speed: f64,
}

impl ClockState {
    /// Calibration where virtual time equals real time from `real_now_ms` on
    pub fn identity(real_now_ms: f64) -> Self {
        Self {
            base_real_ms: real_now_ms,
            base_virtual_ms: real_now_ms,
            speed: 1.0,
        }
    }

    /// Virtual time at the real instant `real_ms`
    #[inline]
    pub fn virtual_at(&self, real_ms: f64) -> f64 {
        self.base_virtual_ms + (real_ms - self.base_real_ms) * self.speed
    }

    /// New calibration at `real_ms` that keeps the current virtual value but
    /// flows at `speed` from here on
    pub fn with_speed(&self, real_ms: f64, speed: f64) -> Self {
        Self {
            base_real_ms: real_ms,
            base_virtual_ms: self.virtual_at(real_ms),
            speed,
        }
    }

    /// New calibration at `real_ms` that jumps to `virtual_ms` and keeps the
    /// current speed
    pub fn with_time(&self, real_ms: f64, virtual_ms: f64) -> Self {
        Self {
            base_real_ms: real_ms,
            base_virtual_ms: virtual_ms,
            speed: self.speed,
        }
    }

    /// Whether every field is finite and the speed is positive
    pub fn is_valid(&self) -> bool {
        self.base_real_ms.is_finite() && self.base_virtual_ms.is_finite() && is_valid_speed(self.speed)
    }
}

/// Whether `speed` is usable as a clock rate
#[inline]
pub(crate) fn is_valid_speed(speed: f64) -> bool {
    speed.is_finite() && speed > 0.0
}
