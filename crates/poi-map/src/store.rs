//! Flat key/value persistence for the session: one JSON blob per key.

use std::{error::Error, fmt::Display, path::PathBuf};

use rustc_hash::FxHashMap;
use serde::{Serialize, de::DeserializeOwned};

/// Key of the resolved [`Location`](crate::types::Location).
pub const LOCATION_KEY: &str = "location";
/// Key of the merged [`PoiDataSet`](crate::types::PoiDataSet).
pub const POI_DATA_KEY: &str = "poi_data";

pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces whatever is stored under `key`.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Reads and decodes the JSON value under `key`.
pub fn load<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Option<T>, StoreError> {
    store
        .get(key)?
        .map(|raw| serde_json::from_str(&raw).map_err(StoreError::from))
        .transpose()
}

/// Encodes `value` as JSON and stores it under `key`.
pub fn save<T: Serialize + ?Sized>(
    store: &mut dyn Store,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_string(value)?)
}

/// Store living as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store keeping every key in `<dir>/<key>.json`.
#[derive(Debug)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        log::debug!("Opened store in '{}'", dir.display());
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        let mut path = self.dir.clone();
        path.push(key);
        path.set_extension("json");
        path
    }
}

impl Store for JsonDirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Error for StoreError {}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "store io error: {err}"),
            Self::Json(err) => write!(f, "stored value is not valid json: {err}"),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, Location};

    fn location() -> Location {
        Location {
            latitude: 50.054,
            longitude: 19.9354,
            address: Address {
                country: Some("Polska".to_owned()),
                city: Some("Kraków".to_owned()),
                street: None,
                postal_code: Some("31-001".to_owned()),
            },
        }
    }

    #[test]
    fn memory_store_overwrites() {
        let mut store = MemoryStore::default();
        assert_eq!(load::<Location>(&store, LOCATION_KEY).unwrap(), None);

        save(&mut store, LOCATION_KEY, &location()).unwrap();
        let mut moved = location();
        moved.latitude = 0.;
        save(&mut store, LOCATION_KEY, &moved).unwrap();

        assert_eq!(load::<Location>(&store, LOCATION_KEY).unwrap(), Some(moved));
    }

    #[test]
    fn dir_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("poi-map-store-{}", std::process::id()));
        let mut store = JsonDirStore::open(&dir).unwrap();

        save(&mut store, LOCATION_KEY, &location()).unwrap();
        assert!(dir.join("location.json").exists());
        assert_eq!(
            load::<Location>(&store, LOCATION_KEY).unwrap(),
            Some(location())
        );

        store.remove(LOCATION_KEY).unwrap();
        store.remove(LOCATION_KEY).unwrap();
        assert_eq!(store.get(LOCATION_KEY).unwrap(), None);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn corrupt_value_is_json_error() {
        let mut store = MemoryStore::default();
        store.set(POI_DATA_KEY, "{not json".to_owned()).unwrap();
        assert!(matches!(
            load::<Location>(&store, POI_DATA_KEY),
            Err(StoreError::Json(_))
        ));
    }
}
