mod nominatim;

use std::{error::Error, fmt::Display, future::Future};

use crate::types::{AddressQuery, Location};

pub use nominatim::NominatimClient;

#[derive(Debug)]
pub enum GeocodeError {
    Http(reqwest::Error),
    Status(u16),
    Timeout,
    Decode(String),
    /// The service answered but had no candidate for the address.
    NotFound,
}

impl Error for GeocodeError {}

impl Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "geocoding request failed: {err}"),
            Self::Status(status) => write!(f, "geocoding service answered with status {status}"),
            Self::Timeout => write!(f, "geocoding request timed out"),
            Self::Decode(msg) => write!(f, "malformed geocoding response: {msg}"),
            Self::NotFound => write!(f, "location not found"),
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Http(value)
        }
    }
}

/// Resolves a free-form address to the best matching location.
pub trait Geocode {
    fn geocode(
        &self,
        query: &AddressQuery,
    ) -> impl Future<Output = Result<Location, GeocodeError>> + Send;
}
