mod query;

use std::{error::Error, fmt::Display, future::Future, time::Duration};

use serde::Deserialize;

use crate::{
    bbox::BoundingBox,
    config::Config,
    types::{PoiRecord, PoiType},
};

pub use query::OverpassQuery;

/// Failure of a single POI type request.
#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Status(u16),
    Timeout,
    Decode(String),
    /// The request task died before reporting back.
    Task(String),
}

impl Error for FetchError {}

impl Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "request failed: {err}"),
            Self::Status(status) => write!(f, "service answered with status {status}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Decode(msg) => write!(f, "malformed response: {msg}"),
            Self::Task(msg) => write!(f, "request task failed: {msg}"),
        }
    }
}

impl From<reqwest::Error> for FetchError {
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

/// Source of POI records for one type inside a box.
///
/// Implementations are shared between concurrently running requests.
pub trait PoiSource: Send + Sync + 'static {
    fn fetch(
        &self,
        poi_type: &PoiType,
        bbox: &BoundingBox,
    ) -> impl Future<Output = Result<Vec<PoiRecord>, FetchError>> + Send;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<PoiRecord>,
}

/// [`PoiSource`] backed by an Overpass API interpreter endpoint.
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl OverpassClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            url: config.overpass_url.clone(),
            timeout: config.timeout(),
        })
    }
}

impl PoiSource for OverpassClient {
    async fn fetch(
        &self,
        poi_type: &PoiType,
        bbox: &BoundingBox,
    ) -> Result<Vec<PoiRecord>, FetchError> {
        let query = OverpassQuery::new(poi_type, bbox, self.timeout.as_secs()).to_string();
        log::debug!("Overpass query: {query}");

        let response = self
            .client
            .get(&self.url)
            .query(&[("data", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: OverpassResponse = response.json().await?;
        Ok(body.elements)
    }
}
