// ABOUTME: Clock module for timewarp
// ABOUTME: Provides time sources, the calibration triple, and the virtual time engine

mod engine;
mod source;
mod state;
mod target;

pub use engine::{Calibration, VirtualClock};
pub use source::{ManualClock, SystemClock, TimeSource};
pub use state::ClockState;
pub use target::TimeTarget;
