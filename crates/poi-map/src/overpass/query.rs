use std::fmt::Display;

use crate::{bbox::BoundingBox, types::PoiType};

/// Overpass QL query for all nodes of one POI type inside a box.
///
/// Renders as `[out:json][timeout:<secs>];node[<category>=<subtype>](s,w,n,e);out meta;`.
#[derive(Clone, Debug)]
pub struct OverpassQuery<'a> {
    poi_type: &'a PoiType,
    bbox: &'a BoundingBox,
    timeout_secs: u64,
}

impl<'a> OverpassQuery<'a> {
    pub fn new(poi_type: &'a PoiType, bbox: &'a BoundingBox, timeout_secs: u64) -> Self {
        Self {
            poi_type,
            bbox,
            timeout_secs,
        }
    }
}

impl Display for OverpassQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[out:json][timeout:{}];node[{}={}]{};out meta;",
            self.timeout_secs, self.poi_type.category, self.poi_type.subtype, self.bbox
        )
    }
}
