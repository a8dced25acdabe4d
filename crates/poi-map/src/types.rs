use std::{collections::BTreeMap, fmt::Display};

use geo_types::Coord;
use serde::{Deserialize, Serialize};

/// Postal address of a resolved location. Display only; any part may be
/// missing for coarse matches such as a whole country.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
}

/// A geocoded location. Created once per load and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Address,
}

impl Location {
    pub fn coord(&self) -> Coord {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let address = &self.address;
        let parts: Vec<&str> = [&address.street, &address.city, &address.country]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        if !parts.is_empty() {
            write!(f, "{} ", parts.join(", "))?;
        }
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Free-form address as entered by the user. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postalcode: Option<String>,
}

impl AddressQuery {
    /// Field names as used by the address form and the geocoding service.
    pub const FIELDS: [&'static str; 4] = ["country", "city", "street", "postalcode"];

    /// Builds a query from `(field, value)` pairs, dropping empty values and
    /// unknown fields.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut query = Self::default();
        for (field, value) in fields {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match field {
                "country" => &mut query.country,
                "city" => &mut query.city,
                "street" => &mut query.street,
                "postalcode" | "postal_code" => &mut query.postalcode,
                other => {
                    log::debug!("Ignoring unknown address field '{other}'");
                    continue;
                }
            };
            *slot = Some(value.to_owned());
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().next().is_none()
    }

    /// Non-empty fields in form order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        Self::FIELDS
            .into_iter()
            .zip([&self.country, &self.city, &self.street, &self.postalcode])
            .filter_map(|(field, value)| value.as_deref().map(|value| (field, value)))
    }
}

impl Display for AddressQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, value) in self.pairs() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{field}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// OSM key/value pair selecting a kind of POI, e.g. `amenity=cafe`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoiType {
    pub category: String,
    pub subtype: String,
}

impl PoiType {
    pub fn new(category: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subtype: subtype.into(),
        }
    }
}

impl Display for PoiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.category, self.subtype)
    }
}

/// Configured POI types: OSM key (category) to the list of values (subtypes).
///
/// Reference: <https://wiki.openstreetmap.org/wiki/Map_Features>
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiTypes(BTreeMap<String, Vec<String>>);

impl PoiTypes {
    pub fn new(types: BTreeMap<String, Vec<String>>) -> Self {
        Self(types)
    }

    /// Every `(category, subtype)` pair.
    pub fn iter(&self) -> impl Iterator<Item = PoiType> + '_ {
        self.0.iter().flat_map(|(category, subtypes)| {
            subtypes
                .iter()
                .map(move |subtype| PoiType::new(category.as_str(), subtype.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PoiTypes {
    fn default() -> Self {
        Self(BTreeMap::from([(
            "amenity".to_owned(),
            ["restaurant", "cafe", "pub", "fast_food"]
                .map(str::to_owned)
                .to_vec(),
        )]))
    }
}

/// Raw OSM element returned by the POI query service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl PoiRecord {
    /// The `name` tag, if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.tags
            .get("name")
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    pub fn position(&self) -> Coord {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// Drops every record without a usable name.
pub fn purge_unnamed(records: Vec<PoiRecord>) -> Vec<PoiRecord> {
    let total = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|record| record.name().is_some())
        .collect();
    if kept.len() < total {
        log::debug!("Purged {} unnamed records", total - kept.len());
    }
    kept
}

/// Fetched POI records keyed by subtype.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiDataSet(BTreeMap<String, Vec<PoiRecord>>);

impl PoiDataSet {
    pub fn insert(&mut self, subtype: impl Into<String>, records: Vec<PoiRecord>) {
        self.0.insert(subtype.into(), records);
    }

    pub fn get(&self, subtype: &str) -> Option<&[PoiRecord]> {
        self.0.get(subtype).map(Vec::as_slice)
    }

    pub fn subtypes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PoiRecord])> {
        self.0
            .iter()
            .map(|(subtype, records)| (subtype.as_str(), records.as_slice()))
    }

    /// Number of subtypes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}
