// ABOUTME: Virtual time engine
// ABOUTME: Computes virtual "now" and re-calibrates offset and speed without jumps

use crate::clock::source::{SystemClock, TimeSource};
use crate::clock::state::{is_valid_speed, ClockState};
use crate::clock::target::TimeTarget;
use crate::config::ClockConfig;
use crate::error::Error;
use crate::store::{ClockStore, FileStore};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Read-only view of the clock for display and debugging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Virtual time (epoch ms) at the moment the view was taken
    pub virtual_ms: f64,
    /// Current speed multiplier
    pub speed: f64,
}

/// A clock whose time flows independently of the real clock
///
/// The engine owns its calibration; every mutation re-stamps it at the
/// current real instant and is persisted to the attached store, if any.
/// Share it between threads with `Arc<VirtualClock>`.
pub struct VirtualClock {
    /// Uncontrolled real time
    source: Arc<dyn TimeSource>,
    /// Current calibration
    state: RwLock<ClockState>,
    /// Persistence; held from before the state write until the save ends,
    /// so saves land in mutation order
    store: Option<Mutex<ClockStore>>,
}

impl VirtualClock {
    /// Create an in-memory clock tracking `source` at speed 1
    pub fn new(source: impl TimeSource + 'static) -> Self {
        let source: Arc<dyn TimeSource> = Arc::new(source);
        let state = ClockState::identity(source.now_ms());
        Self {
            source,
            state: RwLock::new(state),
            store: None,
        }
    }

    /// Create a clock that resumes from `store`, or starts at real time if
    /// no valid snapshot exists
    pub fn with_store(source: impl TimeSource + 'static, store: ClockStore) -> Self {
        let source: Arc<dyn TimeSource> = Arc::new(source);
        let state = match store.load() {
            Some(state) => {
                log::info!(
                    "Resuming virtual clock: virtual={} speed={}",
                    state.virtual_at(source.now_ms()),
                    state.speed
                );
                state
            }
            None => {
                log::debug!("No saved calibration, starting at real time");
                ClockState::identity(source.now_ms())
            }
        };

        Self {
            source,
            state: RwLock::new(state),
            store: Some(Mutex::new(store)),
        }
    }

    /// Open the real-time clock persisted under `config`'s state directory
    pub fn open(config: &ClockConfig) -> Self {
        let backend = FileStore::new(&config.state_dir);
        let store = ClockStore::new(Box::new(backend), config.storage_key.clone());
        Self::with_store(SystemClock::new(), store)
    }

    /// Current virtual time in epoch milliseconds
    #[inline]
    pub fn now_ms(&self) -> f64 {
        let state = *self.state.read();
        state.virtual_at(self.source.now_ms())
    }

    /// Current virtual time as a UTC date-time
    pub fn now(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.now_ms().floor() as i64).single()
    }

    /// Jump to `target`; time keeps flowing at the current speed afterwards
    ///
    /// Unresolvable targets leave the clock untouched and return
    /// [`Error::InvalidTime`].
    pub fn set_time(&self, target: impl Into<TimeTarget>) -> crate::Result<()> {
        let target = target.into();
        let virtual_ms = target
            .resolve()
            .ok_or_else(|| Error::InvalidTime(target.to_string()))?;

        self.recalibrate(|state, real_ms| state.with_time(real_ms, virtual_ms));
        log::info!("Virtual time set to {}", virtual_ms);
        Ok(())
    }

    /// Change the flow rate without moving the current virtual time
    ///
    /// Zero, negative, or non-finite speeds leave the clock untouched and
    /// return [`Error::InvalidSpeed`].
    pub fn set_speed(&self, speed: f64) -> crate::Result<()> {
        if !is_valid_speed(speed) {
            return Err(Error::InvalidSpeed(speed));
        }

        self.recalibrate(|state, real_ms| state.with_speed(real_ms, speed));
        log::info!("Virtual clock speed set to {}x", speed);
        Ok(())
    }

    /// Move virtual time by `delta_ms` relative to its current value
    pub fn shift(&self, delta_ms: f64) -> crate::Result<()> {
        if !delta_ms.is_finite() {
            return Err(Error::InvalidTime(format!("shift by {delta_ms} ms")));
        }

        self.recalibrate(|state, real_ms| state.with_time(real_ms, state.virtual_at(real_ms) + delta_ms));
        log::info!("Virtual time shifted by {} ms", delta_ms);
        Ok(())
    }

    /// Return to real time at speed 1, discarding any offset
    pub fn reset(&self) {
        self.recalibrate(|_, real_ms| ClockState::identity(real_ms));
        log::info!("Virtual clock reset to real time");
    }

    /// Current virtual time and speed
    pub fn calibration(&self) -> Calibration {
        let state = *self.state.read();
        Calibration {
            virtual_ms: state.virtual_at(self.source.now_ms()),
            speed: state.speed,
        }
    }

    /// Raw calibration triple
    pub fn state(&self) -> ClockState {
        *self.state.read()
    }

    /// Virtual minus real time, in milliseconds
    pub fn offset_ms(&self) -> f64 {
        let state = *self.state.read();
        let real_ms = self.source.now_ms();
        state.virtual_at(real_ms) - real_ms
    }

    /// Forget the persisted calibration (in-memory state is kept)
    pub fn clear_saved(&self) {
        if let Some(store) = &self.store {
            store.lock().clear();
        }
    }

    fn recalibrate(&self, next: impl FnOnce(&ClockState, f64) -> ClockState) {
        // Store before state: a writer queued behind a save must not hold the
        // state lock, or readers would wait on I/O
        let store = self.store.as_ref().map(|store| store.lock());

        let mut state = self.state.write();
        let real_ms = self.source.now_ms();
        let updated = next(&*state, real_ms);
        *state = updated;
        drop(state);

        if let Some(store) = store {
            store.save(&updated);
        }
    }
}

impl TimeSource for VirtualClock {
    #[inline]
    fn now_ms(&self) -> f64 {
        VirtualClock::now_ms(self)
    }
}

impl std::fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualClock")
            .field("state", &*self.state.read())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
