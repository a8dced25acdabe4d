#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;
use poi_map::{
    bbox::BoundingBox,
    geocode::{Geocode, GeocodeError},
    notify::{Notice, Notifier},
    overpass::{FetchError, PoiSource},
    store::{MemoryStore, Store, StoreError},
    types::{Address, AddressQuery, Location, PoiRecord, PoiType},
};

pub const WAWEL: (f64, f64) = (50.054, 19.9354);

pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

pub fn record(id: i64, name: Option<&str>) -> PoiRecord {
    PoiRecord {
        id,
        lat: WAWEL.0 + id as f64 * 1e-4,
        lon: WAWEL.1,
        tags: name
            .map(|name| BTreeMap::from([("name".to_owned(), name.to_owned())]))
            .unwrap_or_default(),
    }
}

pub fn krakow() -> Location {
    Location {
        latitude: WAWEL.0,
        longitude: WAWEL.1,
        address: Address {
            country: Some("Polska".to_owned()),
            city: Some("Kraków".to_owned()),
            street: Some("Wawel".to_owned()),
            postal_code: Some("31-001".to_owned()),
        },
    }
}

/// Geocoder answering every query with the same result and remembering the queries.
#[derive(Default)]
pub struct ScriptedGeocoder {
    location: Option<Location>,
    /// When set, only this query resolves; everything else is not found.
    only: Option<AddressQuery>,
    pub queries: Mutex<Vec<AddressQuery>>,
}

impl ScriptedGeocoder {
    pub fn found(location: Location) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }

    pub fn found_for(query: AddressQuery, location: Location) -> Self {
        Self {
            location: Some(location),
            only: Some(query),
            ..Self::default()
        }
    }

    pub fn not_found() -> Self {
        Self::default()
    }
}

impl Geocode for ScriptedGeocoder {
    async fn geocode(&self, query: &AddressQuery) -> Result<Location, GeocodeError> {
        self.queries.lock().push(query.clone());
        if self.only.as_ref().is_some_and(|only| only != query) {
            return Err(GeocodeError::NotFound);
        }
        self.location.clone().ok_or(GeocodeError::NotFound)
    }
}

/// POI source serving fixed records per subtype. Subtypes without records fail
/// with a gateway timeout status.
#[derive(Default)]
pub struct ScriptedSource {
    records: BTreeMap<String, Vec<PoiRecord>>,
    pub requests: Mutex<Vec<(PoiType, BoundingBox)>>,
}

impl ScriptedSource {
    pub fn with(mut self, subtype: &str, records: Vec<PoiRecord>) -> Self {
        self.records.insert(subtype.to_owned(), records);
        self
    }

    /// Fast food and restaurants succeed, cafes and pubs fail.
    pub fn partial() -> Self {
        Self::default()
            .with(
                "restaurant",
                vec![
                    record(1, Some("Pod Baranami")),
                    record(2, None),
                    record(3, Some("Wierzynek")),
                ],
            )
            .with("fast_food", vec![record(4, Some("Zapiekanki"))])
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl PoiSource for ScriptedSource {
    async fn fetch(
        &self,
        poi_type: &PoiType,
        bbox: &BoundingBox,
    ) -> Result<Vec<PoiRecord>, FetchError> {
        self.requests.lock().push((poi_type.clone(), *bbox));
        self.records
            .get(&poi_type.subtype)
            .cloned()
            .ok_or(FetchError::Status(504))
    }
}

/// Collects notices so tests can look at them after the app took ownership.
#[derive(Clone, Default)]
pub struct RecordingNotifier(Arc<Mutex<Vec<Notice>>>);

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.0.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.0.lock().push(notice);
    }
}

/// Store handle that outlives the app owning it, so a second app can restore
/// the session of the first.
#[derive(Clone, Default)]
pub struct SharedStore(Arc<Mutex<MemoryStore>>);

impl Store for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.lock().get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.0.lock().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.0.lock().remove(key)
    }
}
