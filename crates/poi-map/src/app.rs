use std::{error::Error, fmt::Display};

use serde::Serialize;
use tracing::instrument;

use crate::{
    aggregate::{PendingAggregate, PoiAggregator},
    bbox::{BoundingBox, DEFAULT_SIDE},
    config::Config,
    geocode::{Geocode, GeocodeError},
    map::{MapError, MapState, MapSurface, MarkerId, Selection},
    notify::{LogNotifier, Notice, Notifier},
    overpass::PoiSource,
    store::{self, LOCATION_KEY, MemoryStore, POI_DATA_KEY, Store},
    types::{AddressQuery, Location, PoiDataSet, PoiType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Resolved through the geocoder and fetched from the POI source.
    Geocoded,
    /// Read back from the store without any network call.
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: LoadSource,
    pub layers: usize,
    pub markers: usize,
    /// POI types whose request failed; their layers are missing.
    pub failed: Vec<PoiType>,
}

/// Owns the location, the layer/marker state and the map, and runs every
/// user-triggered transition on them.
pub struct App<G, S, M> {
    config: Config,
    geocoder: G,
    aggregator: PoiAggregator<S>,
    map: M,
    state: MapState,
    store: Box<dyn Store>,
    notifier: Box<dyn Notifier>,
    location: Option<Location>,
}

impl<G, S, M> App<G, S, M>
where
    G: Geocode,
    S: PoiSource,
    M: MapSurface,
{
    /// App with a session-scoped [`MemoryStore`] and a [`LogNotifier`].
    pub fn new(config: Config, geocoder: G, source: S, map: M) -> Self {
        let aggregator = PoiAggregator::new(source, config.poi_types.clone(), config.timeout());
        Self {
            config,
            geocoder,
            aggregator,
            map,
            state: MapState::default(),
            store: Box::new(MemoryStore::default()),
            notifier: Box::new(LogNotifier),
            location: None,
        }
    }

    pub fn with_store(mut self, store: impl Store + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn source(&self) -> &S {
        self.aggregator.source()
    }

    /// Loads a location and its POIs.
    ///
    /// With an address form the address is geocoded; empty forms fall back to
    /// the configured default address. Without a form the stored session is
    /// restored, or the default address geocoded when there is none.
    #[instrument(skip(self))]
    pub async fn load_location(
        &mut self,
        form: Option<AddressQuery>,
    ) -> Result<LoadReport, AppError> {
        let query = match form {
            Some(query) if !query.is_empty() => query,
            Some(_) => self.config.default_address.clone(),
            None => {
                if let Some(report) = self.restore() {
                    return Ok(report);
                }
                self.config.default_address.clone()
            }
        };
        self.locate(&query).await
    }

    async fn locate(&mut self, query: &AddressQuery) -> Result<LoadReport, AppError> {
        let result =
            match tokio::time::timeout(self.config.timeout(), self.geocoder.geocode(query)).await {
                Ok(result) => result,
                Err(_) => Err(GeocodeError::Timeout),
            };

        let location = match result {
            Ok(location) => location,
            Err(err) => {
                self.notifier.notify(match err {
                    GeocodeError::NotFound => Notice::location_not_found(),
                    _ => Notice::geocoding_failed(),
                });
                return Err(err.into());
            }
        };
        log::info!("Geocoded '{query}' to {location}");
        self.persist(LOCATION_KEY, &location);

        let pending = self.launch_fetch(&location);
        self.location = Some(location);
        log::debug!("Waiting for {} POI requests", pending.request_count());

        let report = pending.join().await;
        for poi_type in report.failed_types() {
            self.notifier.notify(Notice::fetch_failed(&poi_type.subtype));
        }
        self.persist(POI_DATA_KEY, &report.data);
        self.state.load(&report.data, &mut self.map);

        Ok(LoadReport {
            source: LoadSource::Geocoded,
            layers: self.state.layers().len(),
            markers: self.state.marker_count(),
            failed: report.failed_types().cloned().collect(),
        })
    }

    /// Computes the query box and starts the POI requests. The map is
    /// initialised while they run.
    fn launch_fetch(&mut self, location: &Location) -> PendingAggregate {
        match self.config.bbox.centered(location.coord()) {
            Some(bbox) => {
                let pending = self.aggregator.launch(bbox);
                self.init_map(location);
                pending
            }
            None => {
                // the viewport only exists once the view is set
                self.init_map(location);
                let bbox = self
                    .config
                    .bbox
                    .from_viewport(&self.map)
                    .unwrap_or_else(|| {
                        log::warn!("Map has no viewport, using a {DEFAULT_SIDE}m box");
                        BoundingBox::around(location.coord(), DEFAULT_SIDE)
                    });
                self.aggregator.launch(bbox)
            }
        }
    }

    fn init_map(&mut self, location: &Location) {
        self.map.set_view(location.coord(), self.config.zoom);
        self.state.reset(&mut self.map);
    }

    /// Rebuilds the map from the stored location and POI data, if both exist.
    fn restore(&mut self) -> Option<LoadReport> {
        let location = self.load_stored::<Location>(LOCATION_KEY)?;
        let data = self.load_stored::<PoiDataSet>(POI_DATA_KEY)?;
        log::info!("Restoring {location} from store");

        self.init_map(&location);
        self.state.load(&data, &mut self.map);
        self.location = Some(location);

        Some(LoadReport {
            source: LoadSource::Restored,
            layers: self.state.layers().len(),
            markers: self.state.marker_count(),
            failed: Vec::new(),
        })
    }

    fn load_stored<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        store::load(self.store.as_ref(), key).unwrap_or_else(|err| {
            log::warn!("Ignoring stored '{key}': {err}");
            None
        })
    }

    fn persist<T: Serialize>(&mut self, key: &str, value: &T) {
        match store::save(self.store.as_mut(), key, value) {
            Ok(()) => log::debug!("Saved '{key}' to store"),
            Err(err) => log::warn!("Could not save '{key}': {err}"),
        }
    }

    /// Clears the selection, then filters markers by `phrase`.
    pub fn search_markers(&mut self, phrase: &str) -> usize {
        self.state.unselect_marker(&mut self.map);
        self.state.update_markers(phrase, &mut self.map)
    }

    /// Sets a layer's active flag and reconciles the map.
    pub fn set_layer_active(&mut self, layer: &str, active: bool) -> Result<usize, AppError> {
        self.state.set_layer_active(layer, active)?;
        Ok(self.state.update_layers_map(&mut self.map))
    }

    /// Toggles the selection of a marker picked from the list, along with its popup.
    pub fn toggle_marker(&mut self, id: &MarkerId) -> Result<Selection, AppError> {
        let selection = self.state.toggle_marker(id, &mut self.map)?;
        self.map.toggle_popup(id);
        Ok(selection)
    }

    /// Expands or collapses a layer's marker list.
    pub fn toggle_list(&mut self, layer: &str) -> Result<bool, AppError> {
        Ok(self.state.toggle_collapsed(layer)?)
    }
}

#[derive(Debug)]
pub enum AppError {
    Geocode(GeocodeError),
    Map(MapError),
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Geocode(err) => Some(err),
            Self::Map(err) => Some(err),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geocode(err) => write!(f, "{err}"),
            Self::Map(err) => write!(f, "{err}"),
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(value: GeocodeError) -> Self {
        Self::Geocode(value)
    }
}

impl From<MapError> for AppError {
    fn from(value: MapError) -> Self {
        Self::Map(value)
    }
}
