use super::marker::Marker;
use crate::types::PoiRecord;

/// Toggleable group of markers sharing one POI subtype.
#[derive(Clone, Debug)]
pub struct Layer {
    pub(crate) name: String,
    pub(crate) active: bool,
    collapsed: bool,
    pub(crate) markers: Vec<Marker>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            collapsed: true,
            markers: Vec::new(),
        }
    }

    /// Layer holding one marker per named record, in record order.
    pub fn from_records(name: &str, records: &[PoiRecord]) -> Self {
        let mut layer = Self::new(name);
        for record in records {
            if let Some(marker) = Marker::from_record(record, name, layer.markers.len()) {
                layer.markers.push(marker);
            }
        }
        layer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Display-only flag for the layer's marker list; unrelated to visibility.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub(crate) fn toggle_collapsed(&mut self) -> bool {
        self.collapsed = !self.collapsed;
        self.collapsed
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn active_count(&self) -> usize {
        self.markers.iter().filter(|marker| marker.is_active()).count()
    }

    /// `"<name> (<active markers>)"`
    pub fn info(&self) -> String {
        format!("{} ({})", self.name, self.active_count())
    }
}
