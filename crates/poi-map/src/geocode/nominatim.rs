use serde::Deserialize;

use super::{Geocode, GeocodeError};
use crate::{
    config::Config,
    types::{Address, AddressQuery, Location},
};

#[derive(Debug, Deserialize)]
struct Candidate {
    lat: String,
    lon: String,
    #[serde(default)]
    address: CandidateAddress,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateAddress {
    country: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    hamlet: Option<String>,
    suburb: Option<String>,
    county: Option<String>,
    state: Option<String>,
    road: Option<String>,
    postcode: Option<String>,
}

impl TryFrom<Candidate> for Location {
    type Error = GeocodeError;

    fn try_from(value: Candidate) -> Result<Self, Self::Error> {
        let latitude = parse_degrees("lat", &value.lat)?;
        let longitude = parse_degrees("lon", &value.lon)?;
        let address = value.address;

        // smaller places report their name under town, village and so on
        let city = address
            .city
            .or(address.town)
            .or(address.village)
            .or(address.municipality)
            .or(address.hamlet)
            .or(address.suburb)
            .or(address.county)
            .or(address.state);
        if city.is_none() {
            log::debug!("Candidate at ({latitude}, {longitude}) has no locality");
        }

        Ok(Location {
            latitude,
            longitude,
            address: Address {
                country: address.country,
                city,
                street: address.road.filter(|road| !road.is_empty()),
                postal_code: address.postcode,
            },
        })
    }
}

fn parse_degrees(field: &str, value: &str) -> Result<f64, GeocodeError> {
    value
        .parse()
        .map_err(|err| GeocodeError::Decode(format!("{field} '{value}': {err}")))
}

/// Picks the first candidate of a Nominatim `format=json` search response.
fn best_candidate(candidates: Vec<Candidate>) -> Result<Location, GeocodeError> {
    candidates
        .into_iter()
        .next()
        .ok_or(GeocodeError::NotFound)?
        .try_into()
}

/// [`Geocode`] backed by the Nominatim search endpoint.
pub struct NominatimClient {
    client: reqwest::Client,
    url: String,
}

impl NominatimClient {
    pub fn new(config: &Config) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            url: config.nominatim_url.clone(),
        })
    }
}

impl Geocode for NominatimClient {
    async fn geocode(&self, query: &AddressQuery) -> Result<Location, GeocodeError> {
        let mut params: Vec<(&str, &str)> = query.pairs().collect();
        params.push(("format", "json"));
        params.push(("addressdetails", "1"));
        log::debug!("Geocoding {query}");

        let response = self.client.get(&self.url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        best_candidate(response.json().await?)
    }
}
