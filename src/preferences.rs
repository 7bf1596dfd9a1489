// Preference persistence
// User preferences and the recent-search history survive restarts as two JSON
// records in a key-value storage. Reads and writes never fail to the caller:
// storage problems are logged and the store degrades to defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::search_params::TripType;

pub const PREFERENCES_KEY: &str = "travelSearch_userPreferences";
pub const RECENT_SEARCHES_KEY: &str = "travelSearch_recentSearches";
pub const MAX_RECENT_SEARCHES: usize = 10;

pub const DEFAULT_VISIBLE_COLUMNS: [&str; 6] =
    ["airline", "departure", "arrival", "duration", "stops", "price"];
pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

// String key-value storage backing the preference store
pub trait Storage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// One `<key>.json` file per key inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Readers never observe a half-written record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

// Preferences as stored. Every field is optional; absent ones take defaults.
// Also used as the patch type for `save_preferences`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPreferences {
    pub theme: Theme,
    pub currency: String,
    pub language: String,
    pub visible_columns: Vec<String>,
    pub page_size: usize,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            currency: "USD".to_string(),
            language: "en".to_string(),
            visible_columns: DEFAULT_VISIBLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StoredPreferences {
    pub fn resolve(self) -> UserPreferences {
        let defaults = UserPreferences::default();
        UserPreferences {
            theme: self.theme.unwrap_or(defaults.theme),
            currency: self.currency.unwrap_or(defaults.currency),
            language: self.language.unwrap_or(defaults.language),
            visible_columns: self.visible_columns.unwrap_or(defaults.visible_columns),
            page_size: self
                .page_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSearch {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub origin_sky_id: String,
    pub destination_sky_id: String,
    pub origin_entity_id: String,
    pub destination_entity_id: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    pub trip_type: TripType,
    pub timestamp: i64,
}

// A recent search before it gets an id and a timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRecentSearch {
    pub origin: String,
    pub destination: String,
    pub origin_sky_id: String,
    pub destination_sky_id: String,
    pub origin_entity_id: String,
    pub destination_entity_id: String,
    pub date: String,
    pub return_date: Option<String>,
    pub trip_type: TripType,
}

impl RecentSearch {
    fn same_trip(&self, other: &RecentSearch) -> bool {
        self.origin == other.origin && self.destination == other.destination && self.date == other.date
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn search_id(timestamp: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("search_{}_{}", timestamp, suffix)
}

#[derive(Clone)]
pub struct PreferenceStore {
    storage: Arc<dyn Storage>,
}

impl PreferenceStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored record");
                return None;
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| {
                warn!(key, error = %e, "Stored record is corrupt, ignoring it");
            })
            .ok()
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(key, &json));

        if let Err(e) = result {
            warn!(key, error = %e, "Failed to write stored record");
        }
    }

    pub fn load_preferences(&self) -> StoredPreferences {
        self.read_json(PREFERENCES_KEY).unwrap_or_default()
    }

    // Merge the patch into the stored object; keys this version does not know survive
    pub fn save_preferences(&self, patch: &StoredPreferences) {
        let mut merged: Map<String, Value> = self.read_json(PREFERENCES_KEY).unwrap_or_default();

        match serde_json::to_value(patch) {
            Ok(Value::Object(fields)) => merged.extend(fields),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to serialize preferences");
                return;
            }
        }

        debug!(keys = merged.len(), "Saving preferences");
        self.write_json(PREFERENCES_KEY, &merged);
    }

    // Most recent first, at most ten entries
    pub fn load_recent_searches(&self) -> Vec<RecentSearch> {
        let mut searches: Vec<RecentSearch> = self.read_json(RECENT_SEARCHES_KEY).unwrap_or_default();
        searches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        searches.truncate(MAX_RECENT_SEARCHES);
        searches
    }

    pub fn save_recent_search(&self, search: NewRecentSearch) -> RecentSearch {
        self.save_recent_search_at(search, chrono::Utc::now().timestamp_millis())
    }

    pub fn save_recent_search_at(&self, search: NewRecentSearch, timestamp: i64) -> RecentSearch {
        let entry = RecentSearch {
            id: search_id(timestamp),
            origin: search.origin,
            destination: search.destination,
            origin_sky_id: search.origin_sky_id,
            destination_sky_id: search.destination_sky_id,
            origin_entity_id: search.origin_entity_id,
            destination_entity_id: search.destination_entity_id,
            date: search.date,
            return_date: search.return_date,
            trip_type: search.trip_type,
            timestamp,
        };

        let mut searches = self.load_recent_searches();
        searches.retain(|existing| !existing.same_trip(&entry));
        searches.insert(0, entry.clone());
        searches.truncate(MAX_RECENT_SEARCHES);

        self.write_json(RECENT_SEARCHES_KEY, &searches);
        entry
    }

    pub fn clear_recent_searches(&self) {
        if let Err(e) = self.storage.remove(RECENT_SEARCHES_KEY) {
            warn!(error = %e, "Failed to clear recent searches");
        }
    }
}
