use std::{borrow::Borrow, fmt::Display};

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::types::PoiRecord;

/// Identity of a marker: `<layer>:<index within layer>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(layer: &str, index: usize) -> Self {
        Self(format!("{layer}:{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MarkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarkerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    id: MarkerId,
    name: String,
    layer: String,
    position: Coord,
    popup: String,
    pub(crate) active: bool,
    pub(crate) selected: bool,
}

impl Marker {
    /// Marker for `record`, or `None` if the record has no usable name.
    ///
    /// New markers start active and unselected.
    pub fn from_record(record: &PoiRecord, layer: &str, index: usize) -> Option<Self> {
        let name = record.name()?;
        Some(Self {
            id: MarkerId::new(layer, index),
            name: name.to_owned(),
            layer: layer.to_owned(),
            position: record.position(),
            popup: format!("{name}\n{layer}"),
            active: true,
            selected: false,
        })
    }

    pub fn id(&self) -> &MarkerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn position(&self) -> Coord {
        self.position
    }

    pub fn popup(&self) -> &str {
        &self.popup
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Case-insensitive substring match. The empty phrase matches every marker.
    pub fn matches(&self, phrase: &str) -> bool {
        self.name.to_lowercase().contains(&phrase.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn record(name: Option<&str>) -> PoiRecord {
        PoiRecord {
            id: 42,
            lat: 50.0614,
            lon: 19.9372,
            tags: name
                .map(|name| BTreeMap::from([("name".to_owned(), name.to_owned())]))
                .unwrap_or_default(),
        }
    }

    #[test]
    fn unnamed_record_has_no_marker() {
        assert!(Marker::from_record(&record(None), "cafe", 0).is_none());
        assert!(Marker::from_record(&record(Some("")), "cafe", 0).is_none());
    }

    #[test]
    fn marker_from_record() {
        let marker = Marker::from_record(&record(Some("Café Noworolski")), "cafe", 3).unwrap();
        assert_eq!(marker.id().as_str(), "cafe:3");
        assert_eq!(marker.popup(), "Café Noworolski\ncafe");
        assert_eq!(marker.position(), Coord { x: 19.9372, y: 50.0614 });
        assert!(marker.is_active());
        assert!(!marker.is_selected());
    }

    #[test]
    fn matching_ignores_case() {
        let marker = Marker::from_record(&record(Some("Café Noworolski")), "cafe", 0).unwrap();
        assert!(marker.matches(""));
        assert!(marker.matches("noWOR"));
        assert!(marker.matches("CAFÉ"));
        assert!(!marker.matches("zz-no-match"));
    }
}
