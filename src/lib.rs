// ABOUTME: Main library entry point for timewarp
// ABOUTME: Exports the virtual clock engine, persistence layer, and front-end helpers

//! # timewarp
//!
//! A controllable virtual clock. Time-dependent code reads "now" from a
//! [`TimeSource`] instead of the wall clock; the [`VirtualClock`] source maps
//! real time onto virtual time through an adjustable offset and speed
//! multiplier, and remembers that mapping across process restarts.
//!
//! ## Features
//!
//! - **Clock**: virtual time engine with `set_time`, `set_speed` and `reset`
//! - **Store**: best-effort persistence of the calibration to a key-value backend
//! - **Front ends**: shared CLI arguments and a terminal panel
//!
//! ## Example
//!
//! ```no_run
//! use timewarp::{ClockConfig, TimeSource, VirtualClock};
//!
//! let clock = VirtualClock::open(&ClockConfig::default());
//! clock.set_speed(2.0).unwrap();
//! clock.set_time("2030-01-01T09:00").unwrap();
//!
//! println!("virtual now: {} ms", clock.now_ms());
//! ```

#![warn(missing_docs)]

/// Shared CLI arguments for the binaries
pub mod cli;
/// Virtual time engine and time sources
pub mod clock;
/// Clock configuration
pub mod config;
/// Calibration persistence
pub mod store;
/// Terminal panel for inspecting and steering the clock
pub mod tui;

pub use clock::{Calibration, ClockState, ManualClock, SystemClock, TimeSource, TimeTarget, VirtualClock};
pub use config::ClockConfig;
pub use store::{ClockStore, FileStore, KeyValueStore, MemoryStore};

/// Result type for timewarp operations
pub type Result<T> = std::result::Result<T, error::Error>;

/// Error types for timewarp
pub mod error {
    use thiserror::Error;

    /// Error types for timewarp operations
    #[derive(Error, Debug)]
    pub enum Error {
        /// Speed was zero, negative, or not finite
        #[error("Invalid speed: {0} (must be finite and greater than zero)")]
        InvalidSpeed(f64),

        /// Time target or shift could not be resolved to an absolute timestamp
        #[error("Invalid time: {0}")]
        InvalidTime(String),

        /// Storage key is not a plain name
        #[error("Invalid storage key: {0:?}")]
        InvalidKey(String),

        /// Storage backend I/O failure
        #[error("Storage error: {0}")]
        Io(#[from] std::io::Error),

        /// Snapshot could not be encoded or decoded
        #[error("Serialization error: {0}")]
        Serialization(#[from] serde_json::Error),
    }
}
