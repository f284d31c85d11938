use crate::calendar::{DEFAULT_MONTHS_AFTER, DEFAULT_MONTHS_BEFORE, MAX_MONTH_SPAN};
use crate::error::{DayTrackerError, Result};
use crate::store::{JsonFileStore, PersistenceStore, LEGACY_KEY, PRIMARY_KEY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// JSON file holding the key-value store.
    pub storage_path: PathBuf,
    pub primary_key: String,
    pub legacy_key: String,
    pub months_before: u32,
    pub months_after: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("usa-days.json"),
            primary_key: PRIMARY_KEY.to_string(),
            legacy_key: LEGACY_KEY.to_string(),
            months_before: DEFAULT_MONTHS_BEFORE,
            months_after: DEFAULT_MONTHS_AFTER,
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.primary_key.trim().is_empty() || self.legacy_key.trim().is_empty() {
            return Err(DayTrackerError::InvalidConfig(
                "storage keys must not be empty".to_string(),
            ));
        }

        if self.primary_key == self.legacy_key {
            return Err(DayTrackerError::InvalidConfig(format!(
                "primary and legacy key are both '{}'",
                self.primary_key
            )));
        }

        for (name, span) in [
            ("months_before", self.months_before),
            ("months_after", self.months_after),
        ] {
            if span > MAX_MONTH_SPAN {
                return Err(DayTrackerError::InvalidConfig(format!(
                    "{} is {}, at most {} is allowed",
                    name, span, MAX_MONTH_SPAN
                )));
            }
        }

        Ok(())
    }

    pub fn persistence_store(&self) -> PersistenceStore<JsonFileStore> {
        PersistenceStore::with_keys(
            JsonFileStore::new(&self.storage_path),
            &self.primary_key,
            &self.legacy_key,
        )
    }
}
