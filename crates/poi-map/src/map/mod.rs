//! Layer/marker state and its reconciliation with a [`MapSurface`].
//!
//! [`MapState`] is the single owner of every [`Layer`] and [`Marker`]. Every
//! transition takes the surface explicitly and leaves it consistent with the
//! state before returning.

mod layer;
mod marker;
mod surface;

use std::{error::Error, fmt::Display};

use rustc_hash::FxHashMap;

use crate::types::PoiDataSet;

pub use layer::Layer;
pub use marker::{Marker, MarkerId};
pub use surface::{HeadlessMap, MapSurface, MarkerIcon};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    MarkerNotFound(MarkerId),
    LayerNotFound(String),
    /// Markers hidden by the search cannot be selected.
    MarkerInactive(MarkerId),
}

impl Error for MapError {}

impl Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkerNotFound(id) => write!(f, "marker '{id}' not found"),
            Self::LayerNotFound(name) => write!(f, "layer '{name}' not found"),
            Self::MarkerInactive(id) => write!(f, "marker '{id}' is filtered out"),
        }
    }
}

/// Result of [`MapState::toggle_marker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Selected(MarkerId),
    Unselected(MarkerId),
}

#[derive(Debug, Default)]
pub struct MapState {
    layers: Vec<Layer>,
    /// Marker id to `(layer index, marker index)`.
    index: FxHashMap<MarkerId, (usize, usize)>,
    selected: Option<MarkerId>,
}

impl MapState {
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    pub fn marker(&self, id: &MarkerId) -> Option<&Marker> {
        let (layer, marker) = *self.index.get(id)?;
        self.layers.get(layer)?.markers.get(marker)
    }

    pub fn selected(&self) -> Option<&Marker> {
        self.marker(self.selected.as_ref()?)
    }

    pub fn marker_count(&self) -> usize {
        self.index.len()
    }

    fn marker_mut(&mut self, id: &MarkerId) -> Option<&mut Marker> {
        let (layer, marker) = *self.index.get(id)?;
        self.layers.get_mut(layer)?.markers.get_mut(marker)
    }

    fn layer_mut(&mut self, name: &str) -> Result<&mut Layer, MapError> {
        self.layers
            .iter_mut()
            .find(|layer| layer.name() == name)
            .ok_or_else(|| MapError::LayerNotFound(name.to_owned()))
    }

    /// Drops every layer and marker, including their map presence.
    pub fn reset(&mut self, surface: &mut impl MapSurface) {
        surface.clear();
        self.layers.clear();
        self.index.clear();
        self.selected = None;
    }

    /// Builds one layer per subtype of `data` and shows all of it.
    ///
    /// Appends to the current layers; call [`reset`](Self::reset) first when
    /// replacing a location.
    pub fn load(&mut self, data: &PoiDataSet, surface: &mut impl MapSurface) {
        for (subtype, records) in data.iter() {
            let layer = Layer::from_records(subtype, records);
            let layer_index = self.layers.len();

            for (marker_index, marker) in layer.markers().iter().enumerate() {
                surface.set_icon(marker.id(), MarkerIcon::Standard);
                surface.add_marker(layer.name(), marker);
                self.index
                    .insert(marker.id().clone(), (layer_index, marker_index));
            }
            surface.show_layer(layer.name());

            log::debug!("Loaded layer {}", layer.info());
            self.layers.push(layer);
        }
        log::info!(
            "Loaded {} layers with {} markers",
            self.layers.len(),
            self.index.len()
        );
    }

    /// Selects `id`, or unselects it if it already is the selection.
    ///
    /// Any previous selection is cleared first, so at most one marker is
    /// selected at every point.
    pub fn toggle_marker(
        &mut self,
        id: &MarkerId,
        surface: &mut impl MapSurface,
    ) -> Result<Selection, MapError> {
        let marker = self
            .marker(id)
            .ok_or_else(|| MapError::MarkerNotFound(id.clone()))?;
        let already_selected = marker.is_selected();
        if !already_selected && !marker.is_active() {
            return Err(MapError::MarkerInactive(id.clone()));
        }

        self.unselect_marker(surface);
        if already_selected {
            return Ok(Selection::Unselected(id.clone()));
        }

        if let Some(marker) = self.marker_mut(id) {
            marker.selected = true;
        }
        surface.set_icon(id, MarkerIcon::Selected);
        self.selected = Some(id.clone());
        log::debug!("Selected marker {id}");

        Ok(Selection::Selected(id.clone()))
    }

    /// Clears the selection, returning the previously selected marker.
    ///
    /// Only `selected` changes; the marker stays active.
    pub fn unselect_marker(&mut self, surface: &mut impl MapSurface) -> Option<MarkerId> {
        let id = self.selected.take()?;
        if let Some(marker) = self.marker_mut(&id) {
            marker.selected = false;
        }
        surface.set_icon(&id, MarkerIcon::Standard);
        log::debug!("Unselected marker {id}");
        Some(id)
    }

    pub fn set_layer_active(&mut self, name: &str, active: bool) -> Result<(), MapError> {
        self.layer_mut(name)?.active = active;
        Ok(())
    }

    /// Flips the collapsed flag of a layer's marker list, returning the new value.
    pub fn toggle_collapsed(&mut self, name: &str) -> Result<bool, MapError> {
        Ok(self.layer_mut(name)?.toggle_collapsed())
    }

    /// Shows active layers and hides inactive ones on `surface`.
    ///
    /// Returns the number of layers whose presence changed; a second call without
    /// intervening state changes returns 0.
    pub fn update_layers_map(&self, surface: &mut impl MapSurface) -> usize {
        let mut changed = 0;
        for layer in &self.layers {
            let shown = surface.has_layer(layer.name());
            if !layer.is_active() && shown {
                surface.hide_layer(layer.name());
                changed += 1;
            } else if layer.is_active() && !shown {
                surface.show_layer(layer.name());
                changed += 1;
            }
        }
        if changed > 0 {
            log::debug!("Updated {changed} layers on the map");
        }
        changed
    }

    /// Keeps markers whose name contains `phrase` (ignoring case) and removes
    /// the rest from their layers.
    ///
    /// Visits the markers of every layer, active or not: layer visibility and
    /// the search filter are independent. Leaves the selection untouched.
    /// Returns the number of matching markers.
    pub fn update_markers(&mut self, phrase: &str, surface: &mut impl MapSurface) -> usize {
        let mut matching = 0;
        for layer in &mut self.layers {
            for marker in &mut layer.markers {
                let matches = marker.matches(phrase);
                let present = surface.has_marker(&layer.name, marker.id());
                if present && !matches {
                    surface.remove_marker(&layer.name, marker.id());
                    marker.active = false;
                } else if !present && matches {
                    surface.add_marker(&layer.name, marker);
                    marker.active = true;
                }
                if matches {
                    matching += 1;
                }
            }
        }
        log::info!("Search '{phrase}' matched {matching} markers");
        matching
    }
}
