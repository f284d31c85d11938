//! Durable storage of marked days.
//!
//! Storage is modelled as a flat string key-value store. The current document
//! format lives under the primary key; an older format (a bare list of day
//! keys) is still read from the legacy key but never written.

use crate::error::{DayTrackerError, Result};
use crate::schema::{parse_legacy_days, SavedData};
use crate::utils::{
    day_key, day_start_utc, format_timestamp_millis, parse_day_key, parse_day_or_timestamp,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const PRIMARY_KEY: &str = "usaCalculatorData";
pub const LEGACY_KEY: &str = "usaDays";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Key-value store backed by one JSON object on disk. The whole file is
/// rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&raw)?)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(DayTrackerError::SerializationError(e)) => {
                warn!(
                    "Discarding unreadable store file {}: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(&entries)?)?;
        fs::rename(&tmp_path, &self.path).map_err(|e| DayTrackerError::StorageError {
            key: key.to_string(),
            details: format!("could not replace {}: {}", self.path.display(), e),
        })
    }
}

/// What the engine needs back from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredState {
    pub days: HashSet<NaiveDate>,
    pub simulated_date: Option<NaiveDate>,
}

/// Applies the load/save policy on top of a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct PersistenceStore<S: KeyValueStore> {
    store: S,
    primary_key: String,
    legacy_key: String,
}

impl<S: KeyValueStore> PersistenceStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_keys(store, PRIMARY_KEY, LEGACY_KEY)
    }

    pub fn with_keys(store: S, primary_key: &str, legacy_key: &str) -> Self {
        Self {
            store,
            primary_key: primary_key.to_string(),
            legacy_key: legacy_key.to_string(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Primary format first, then legacy, then empty. Never fails.
    pub fn load(&self) -> StoredState {
        match self.read_primary() {
            Ok(Some(state)) => {
                debug!(
                    "Loaded {} days from '{}'",
                    state.days.len(),
                    self.primary_key
                );
                return state;
            }
            Ok(None) => debug!("Nothing stored under '{}'", self.primary_key),
            Err(e) => warn!(
                "Failed to load '{}', trying legacy format: {}",
                self.primary_key, e
            ),
        }

        match self.read_legacy() {
            Ok(Some(state)) => {
                debug!(
                    "Loaded {} days from legacy key '{}'",
                    state.days.len(),
                    self.legacy_key
                );
                state
            }
            Ok(None) => StoredState::default(),
            Err(e) => {
                warn!("Failed to load legacy data '{}': {}", self.legacy_key, e);
                StoredState::default()
            }
        }
    }

    /// Writes the primary format. The legacy key is left untouched.
    pub fn save(&mut self, state: &StoredState, now: DateTime<Utc>) -> Result<()> {
        let mut days: Vec<NaiveDate> = state.days.iter().copied().collect();
        days.sort_unstable();

        let data = SavedData {
            usa_days: days.into_iter().map(day_key).collect(),
            simulated_date: state
                .simulated_date
                .map(|day| format_timestamp_millis(day_start_utc(day))),
            last_saved: Some(format_timestamp_millis(now)),
        };

        let json = serde_json::to_string(&data)?;
        self.store.set(&self.primary_key, json)
    }

    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get(key)?
            .filter(|raw| !raw.trim().is_empty()))
    }

    fn read_primary(&self) -> Result<Option<StoredState>> {
        let Some(raw) = self.read_raw(&self.primary_key)? else {
            return Ok(None);
        };

        let data: SavedData = serde_json::from_str(&raw)?;
        let simulated_date = match data.simulated_date.as_deref() {
            Some(value) => match parse_day_or_timestamp(value) {
                Ok(day) => Some(day),
                Err(e) => {
                    warn!("Ignoring simulated date: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(Some(StoredState {
            days: parse_day_keys(&data.usa_days),
            simulated_date,
        }))
    }

    fn read_legacy(&self) -> Result<Option<StoredState>> {
        let Some(raw) = self.read_raw(&self.legacy_key)? else {
            return Ok(None);
        };

        let keys = parse_legacy_days(&raw)?;
        Ok(Some(StoredState {
            days: parse_day_keys(&keys),
            simulated_date: None,
        }))
    }
}

fn parse_day_keys(keys: &[String]) -> HashSet<NaiveDate> {
    keys.iter()
        .filter_map(|key| match parse_day_key(key) {
            Ok(day) => Some(day),
            Err(e) => {
                warn!("Skipping stored day: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn saved_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_empty_store_loads_empty_state() {
        let store = PersistenceStore::new(MemoryStore::new());
        assert_eq!(store.load(), StoredState::default());
    }

    #[test]
    fn test_save_writes_primary_format() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        let state = StoredState {
            days: [d(2024, 2, 2), d(2024, 1, 1)].into_iter().collect(),
            simulated_date: Some(d(2024, 2, 15)),
        };
        store.save(&state, saved_at()).unwrap();

        let raw = store.inner().get(PRIMARY_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["usaDays"], serde_json::json!(["2024-01-01", "2024-02-02"]));
        assert_eq!(value["simulatedDate"], "2024-02-15T00:00:00.000Z");
        assert_eq!(value["lastSaved"], "2024-03-01T10:30:00.000Z");

        assert_eq!(store.inner().get(LEGACY_KEY).unwrap(), None);
    }

    #[test]
    fn test_save_without_simulated_date_writes_null() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        store.save(&StoredState::default(), saved_at()).unwrap();

        let raw = store.inner().get(PRIMARY_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["simulatedDate"].is_null());
        assert_eq!(value["usaDays"], serde_json::json!([]));
    }

    #[test]
    fn test_round_trip() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        let state = StoredState {
            days: [d(2023, 5, 5), d(2024, 2, 29), d(2021, 12, 31)]
                .into_iter()
                .collect(),
            simulated_date: Some(d(2024, 3, 1)),
        };
        store.save(&state, saved_at()).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_primary_tolerates_duplicates_and_bad_entries() {
        let raw = r#"{"usaDays": ["2024-01-02", "2024-01-01", "2024-01-02", "nope"], "simulatedDate": null}"#;
        let store = PersistenceStore::new(MemoryStore::new().with_entry(PRIMARY_KEY, raw));

        let state = store.load();
        assert_eq!(state.days.len(), 2);
        assert!(state.days.contains(&d(2024, 1, 1)));
        assert_eq!(state.simulated_date, None);
    }

    #[test]
    fn test_primary_accepts_bare_day_for_simulated_date() {
        let raw = r#"{"usaDays": [], "simulatedDate": "2024-06-01"}"#;
        let store = PersistenceStore::new(MemoryStore::new().with_entry(PRIMARY_KEY, raw));
        assert_eq!(store.load().simulated_date, Some(d(2024, 6, 1)));
    }

    #[test]
    fn test_legacy_fallback_when_primary_missing() {
        let store = PersistenceStore::new(
            MemoryStore::new().with_entry(LEGACY_KEY, r#"["2022-05-05"]"#),
        );
        let state = store.load();
        assert_eq!(state.days, [d(2022, 5, 5)].into_iter().collect());
        assert_eq!(state.simulated_date, None);
    }

    #[test]
    fn test_non_string_entries_do_not_discard_valid_days() {
        let raw = r#"{"usaDays": ["2024-01-01", null, 5], "simulatedDate": null}"#;
        let store = PersistenceStore::new(MemoryStore::new().with_entry(PRIMARY_KEY, raw));
        assert_eq!(store.load().days, [d(2024, 1, 1)].into_iter().collect());

        let store = PersistenceStore::new(
            MemoryStore::new().with_entry(LEGACY_KEY, r#"["2024-01-01", null, 5]"#),
        );
        assert_eq!(store.load().days, [d(2024, 1, 1)].into_iter().collect());
    }

    #[test]
    fn test_file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("store.json"));
        store.set(LEGACY_KEY, r#"["2022-05-05"]"#.to_string()).unwrap();
        store.set(PRIMARY_KEY, "{}".to_string()).unwrap();

        assert_eq!(
            store.get(LEGACY_KEY).unwrap().as_deref(),
            Some(r#"["2022-05-05"]"#)
        );
        assert_eq!(store.get(PRIMARY_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(store.get(PRIMARY_KEY).is_err());
        store.set(PRIMARY_KEY, "{}".to_string()).unwrap();
        assert_eq!(store.get(PRIMARY_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_propagates_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be read as a store
        let path = dir.path().join("store.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "keep").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(matches!(
            store.set(PRIMARY_KEY, "{}".to_string()),
            Err(DayTrackerError::IoError(_))
        ));
        assert!(path.join("keep.txt").exists());
    }

    #[test]
    fn test_legacy_fallback_when_primary_corrupt() {
        let store = PersistenceStore::new(
            MemoryStore::new()
                .with_entry(PRIMARY_KEY, "{not json")
                .with_entry(LEGACY_KEY, r#"["2022-05-05", "2022-05-06"]"#),
        );
        assert_eq!(store.load().days.len(), 2);
    }

    #[test]
    fn test_primary_wins_over_legacy() {
        let store = PersistenceStore::new(
            MemoryStore::new()
                .with_entry(PRIMARY_KEY, r#"{"usaDays": ["2024-01-01"]}"#)
                .with_entry(LEGACY_KEY, r#"["2022-05-05"]"#),
        );
        assert_eq!(store.load().days, [d(2024, 1, 1)].into_iter().collect());
    }

    #[test]
    fn test_both_corrupt_loads_empty() {
        let store = PersistenceStore::new(
            MemoryStore::new()
                .with_entry(PRIMARY_KEY, "[1, 2")
                .with_entry(LEGACY_KEY, r#"{"a": 1}"#),
        );
        assert_eq!(store.load(), StoredState::default());
    }

    #[test]
    fn test_custom_keys() {
        let mut store =
            PersistenceStore::with_keys(MemoryStore::new(), "trackerState", "oldDays");
        store.save(&StoredState::default(), saved_at()).unwrap();
        assert!(store.inner().get("trackerState").unwrap().is_some());
        assert!(store.inner().get(PRIMARY_KEY).unwrap().is_none());
    }
}
