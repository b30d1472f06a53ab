// ABOUTME: Fail-soft load/save of the clock calibration
// ABOUTME: Validates snapshots on load and never surfaces storage errors to callers

use crate::clock::ClockState;
use crate::store::backend::KeyValueStore;

/// Persists one [`ClockState`] under a well-known key
///
/// Storage is best-effort: a missing, unreadable, or invalid snapshot loads
/// as `None`, and failed writes are logged and dropped.
pub struct ClockStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl ClockStore {
    /// Create a store writing to `backend` under `key`
    pub fn new(backend: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Key the snapshot is stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load and validate the saved calibration
    pub fn load(&self) -> Option<ClockState> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::debug!("No clock snapshot under '{}'", self.key);
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read clock snapshot '{}': {}", self.key, e);
                return None;
            }
        };

        let state: ClockState = match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Ignoring malformed clock snapshot '{}': {}", self.key, e);
                return None;
            }
        };

        if !state.is_valid() {
            log::warn!("Ignoring invalid clock snapshot '{}': {:?}", self.key, state);
            return None;
        }

        log::debug!("Loaded clock snapshot '{}': {:?}", self.key, state);
        Some(state)
    }

    /// Save the calibration; failures are logged, not returned
    pub fn save(&self, state: &ClockState) {
        let result = serde_json::to_string(state)
            .map_err(crate::error::Error::from)
            .and_then(|json| self.backend.set(&self.key, &json));

        if let Err(e) = result {
            log::warn!("Failed to save clock snapshot '{}': {}", self.key, e);
        }
    }

    /// Remove the saved calibration
    pub fn clear(&self) {
        if let Err(e) = self.backend.remove(&self.key) {
            log::warn!("Failed to clear clock snapshot '{}': {}", self.key, e);
        }
    }
}

impl std::fmt::Debug for ClockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockStore").field("key", &self.key).finish()
    }
}
