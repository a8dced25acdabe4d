use std::{error::Error, fmt::Display, fs::File, io::BufReader, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    bbox::BboxMode,
    types::{AddressQuery, PoiTypes},
};

/// Accepted range for the network timeout in seconds.
pub const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=180;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// POI types requested for every location.
    pub poi_types: PoiTypes,
    /// Address loaded when no address is given and no session can be restored.
    pub default_address: AddressQuery,
    pub bbox: BboxMode,
    /// Applied to every network call and passed on to Overpass.
    pub timeout_secs: u64,
    pub overpass_url: String,
    pub nominatim_url: String,
    pub user_agent: String,
    /// Initial map zoom level.
    pub zoom: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poi_types: PoiTypes::default(),
            default_address: AddressQuery {
                country: Some("United Kingdom".to_owned()),
                city: Some("London".to_owned()),
                street: Some("1 Oxford Street".to_owned()),
                postalcode: None,
            },
            bbox: BboxMode::default(),
            timeout_secs: 60,
            overpass_url: "https://www.overpass-api.de/api/interpreter".to_owned(),
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_owned(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
            zoom: 16,
        }
    }
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading config from '{}'", path.display());
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TIMEOUT_RANGE.contains(&self.timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "timeout_secs must lie in {}..={}, got {}",
                TIMEOUT_RANGE.start(),
                TIMEOUT_RANGE.end(),
                self.timeout_secs
            )));
        }
        if self.poi_types.is_empty() {
            return Err(ConfigError::Invalid("no poi types configured".to_owned()));
        }
        if let BboxMode::Centered { side } = self.bbox {
            if !(side.is_finite() && side > 0.) {
                return Err(ConfigError::Invalid(format!(
                    "bbox side must be a positive number of metres, got {side}"
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl Error for ConfigError {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config: {err}"),
            Self::Json(err) => write!(f, "cannot parse config: {err}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
