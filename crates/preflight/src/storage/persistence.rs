//! Fail-soft persistence adapter.
//!
//! Nothing in here returns an error. A store failure, a malformed blob or a
//! serialization failure is logged and then treated as "no data" on read and
//! as a no-op on write, so data entry is never blocked by storage.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::{KeyValueStore, MemoryStore, StorageStats};
use crate::mission::{MissionDraft, MissionRecord};
use crate::profile::AircraftProfile;

/// Key names of the three persisted collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Saved missions, newest first.
    pub missions: String,
    /// Aircraft profiles.
    pub profiles: String,
    /// The in-progress draft.
    pub draft: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            missions: "uas_missions".to_string(),
            profiles: "uas_aircraft_profiles".to_string(),
            draft: "uas_current_mission".to_string(),
        }
    }
}

/// Typed, fail-soft access to a [`KeyValueStore`].
#[derive(Debug)]
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl Persistence {
    /// Wrap a store.
    pub fn new(store: impl KeyValueStore + 'static, keys: StorageKeys) -> Self {
        Self {
            store: Box::new(store),
            keys,
        }
    }

    /// Wrap an already boxed store.
    #[must_use]
    pub fn from_boxed(store: Box<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    /// A persistence adapter over a fresh [`MemoryStore`] with default keys.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), StorageKeys::default())
    }

    /// The configured key names.
    #[must_use]
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Statistics of the underlying store, or `None` if it cannot say.
    #[must_use]
    pub fn stats(&self) -> Option<StorageStats> {
        match self.store.stats() {
            Ok(stats) => Some(stats),
            Err(err) => {
                error!("Failed to read storage statistics: {}", err);
                None
            }
        }
    }

    /// Read and decode the value under `key`.
    ///
    /// Returns `None` when the key is absent, the store fails, or the stored
    /// JSON does not decode as `T`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!("Failed to read '{}': {}", key, err);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Ignoring malformed data under '{}': {}", key, err);
                None
            }
        }
    }

    /// Encode and store `value` under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                error!("Failed to encode data for '{}': {}", key, err);
                return;
            }
        };

        if let Err(err) = self.store.put(key, &raw) {
            error!("Failed to save '{}': {}", key, err);
        }
    }

    /// Remove `key`.
    pub fn clear(&self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            error!("Failed to clear '{}': {}", key, err);
        }
    }

    /// Saved missions, newest first.
    ///
    /// Entries that cannot be read as a mission are skipped.
    #[must_use]
    pub fn missions(&self) -> Vec<MissionRecord> {
        self.load::<Vec<Value>>(&self.keys.missions)
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| {
                let record = MissionRecord::from_stored(entry);
                if record.is_none() {
                    debug!("Skipping unreadable mission entry");
                }
                record
            })
            .collect()
    }

    /// Add a mission at the front of the saved list.
    ///
    /// Existing entries are carried over verbatim, including ones this
    /// version cannot read.
    pub fn prepend_mission(&self, record: &MissionRecord) {
        let encoded = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(err) => {
                error!("Failed to encode mission {}: {}", record.mission_number, err);
                return;
            }
        };

        let mut missions = self
            .load::<Vec<Value>>(&self.keys.missions)
            .unwrap_or_default();
        missions.insert(0, encoded);
        self.save(&self.keys.missions, &missions);
    }

    /// Saved aircraft profiles.
    #[must_use]
    pub fn profiles(&self) -> Vec<AircraftProfile> {
        self.load::<Vec<Value>>(&self.keys.profiles)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(profile) => Some(profile),
                Err(err) => {
                    warn!("Skipping unreadable aircraft profile: {}", err);
                    None
                }
            })
            .collect()
    }

    /// Replace the saved profiles.
    pub fn save_profiles(&self, profiles: &[AircraftProfile]) {
        self.save(&self.keys.profiles, profiles);
    }

    /// The stored draft blob, undecoded.
    ///
    /// Decoding is field-by-field in [`MissionDraft::restore`].
    #[must_use]
    pub fn draft(&self) -> Option<Value> {
        self.load(&self.keys.draft)
    }

    /// Snapshot the draft.
    pub fn save_draft(&self, draft: &MissionDraft) {
        self.save(&self.keys.draft, draft);
    }

    /// Drop the stored draft.
    pub fn clear_draft(&self) {
        self.clear(&self.keys.draft);
    }
}
