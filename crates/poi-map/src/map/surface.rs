use geo_types::Coord;
use rustc_hash::{FxHashMap, FxHashSet};

use super::marker::{Marker, MarkerId};
use crate::{bbox::BoundingBox, geodesy};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MarkerIcon {
    #[default]
    Standard,
    Selected,
}

/// The rendered map that [`MapState`](super::MapState) keeps in sync.
///
/// A marker is visible when it has been added to its layer and the layer is shown.
pub trait MapSurface {
    fn set_view(&mut self, center: Coord, zoom: u8);

    /// Currently visible bounds, if a view has been set.
    fn viewport(&self) -> Option<BoundingBox>;

    /// Removes every layer and marker.
    fn clear(&mut self);

    fn has_layer(&self, layer: &str) -> bool;

    fn show_layer(&mut self, layer: &str);

    fn hide_layer(&mut self, layer: &str);

    fn has_marker(&self, layer: &str, marker: &MarkerId) -> bool;

    fn add_marker(&mut self, layer: &str, marker: &Marker);

    fn remove_marker(&mut self, layer: &str, marker: &MarkerId);

    fn set_icon(&mut self, marker: &MarkerId, icon: MarkerIcon);

    fn toggle_popup(&mut self, marker: &MarkerId);
}

/// Size of a 256px web mercator tile at zoom 0, in metres per pixel at the equator.
const METRES_PER_PIXEL_Z0: f64 = 156_543.033_92;

#[derive(Clone, Debug)]
struct PlacedMarker {
    name: String,
    position: Coord,
}

/// In-memory [`MapSurface`] without any rendering.
#[derive(Clone, Debug)]
pub struct HeadlessMap {
    center: Option<Coord>,
    zoom: u8,
    size: (u32, u32),
    groups: FxHashMap<String, FxHashMap<MarkerId, PlacedMarker>>,
    shown: FxHashSet<String>,
    icons: FxHashMap<MarkerId, MarkerIcon>,
    popup: Option<MarkerId>,
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl HeadlessMap {
    /// Map with a viewport of `width`×`height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            center: None,
            zoom: 0,
            size: (width, height),
            groups: FxHashMap::default(),
            shown: FxHashSet::default(),
            icons: FxHashMap::default(),
            popup: None,
        }
    }

    pub fn center(&self) -> Option<Coord> {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Markers of shown layers, sorted by id.
    pub fn visible_markers(&self) -> Vec<&MarkerId> {
        let mut visible: Vec<_> = self
            .shown
            .iter()
            .filter_map(|layer| self.groups.get(layer))
            .flat_map(|group| group.keys())
            .collect();
        visible.sort();
        visible
    }

    /// Name and position of a marker currently added to `layer`.
    pub fn placed(&self, layer: &str, marker: &MarkerId) -> Option<(&str, Coord)> {
        self.groups
            .get(layer)?
            .get(marker)
            .map(|placed| (placed.name.as_str(), placed.position))
    }

    pub fn icon(&self, marker: &MarkerId) -> MarkerIcon {
        self.icons.get(marker).copied().unwrap_or_default()
    }

    pub fn open_popup(&self) -> Option<&MarkerId> {
        self.popup.as_ref()
    }
}

impl MapSurface for HeadlessMap {
    fn set_view(&mut self, center: Coord, zoom: u8) {
        self.center = Some(center);
        self.zoom = zoom;
    }

    fn viewport(&self) -> Option<BoundingBox> {
        let center = self.center?;
        let metres_per_pixel =
            METRES_PER_PIXEL_Z0 * center.y.to_radians().cos() / 2f64.powi(i32::from(self.zoom));
        let half_width = metres_per_pixel * f64::from(self.size.0) / 2.;
        let half_height = metres_per_pixel * f64::from(self.size.1) / 2.;

        let west = geodesy::destination_point(center, half_width, 270.).x;
        let east = geodesy::destination_point(center, half_width, 90.).x;
        let south = geodesy::destination_point(center, half_height, 180.).y;
        let north = geodesy::destination_point(center, half_height, 0.).y;

        Some(BoundingBox::new(
            Coord { x: west, y: south },
            Coord { x: east, y: north },
        ))
    }

    fn clear(&mut self) {
        self.groups.clear();
        self.shown.clear();
        self.icons.clear();
        self.popup = None;
    }

    fn has_layer(&self, layer: &str) -> bool {
        self.shown.contains(layer)
    }

    fn show_layer(&mut self, layer: &str) {
        self.groups.entry(layer.to_owned()).or_default();
        self.shown.insert(layer.to_owned());
    }

    fn hide_layer(&mut self, layer: &str) {
        self.shown.remove(layer);
    }

    fn has_marker(&self, layer: &str, marker: &MarkerId) -> bool {
        self.groups
            .get(layer)
            .is_some_and(|group| group.contains_key(marker))
    }

    fn add_marker(&mut self, layer: &str, marker: &Marker) {
        self.groups.entry(layer.to_owned()).or_default().insert(
            marker.id().clone(),
            PlacedMarker {
                name: marker.name().to_owned(),
                position: marker.position(),
            },
        );
    }

    fn remove_marker(&mut self, layer: &str, marker: &MarkerId) {
        if let Some(group) = self.groups.get_mut(layer) {
            group.remove(marker);
        }
        if self.popup.as_ref() == Some(marker) {
            self.popup = None;
        }
    }

    fn set_icon(&mut self, marker: &MarkerId, icon: MarkerIcon) {
        self.icons.insert(marker.clone(), icon);
    }

    fn toggle_popup(&mut self, marker: &MarkerId) {
        self.popup = match self.popup.take() {
            Some(open) if &open == marker => None,
            _ => Some(marker.clone()),
        };
    }
}
