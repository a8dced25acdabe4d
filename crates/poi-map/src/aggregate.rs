//! Concurrent fetch of every configured POI type and the wait-for-all join.

use std::{sync::Arc, time::Duration};

use rustc_hash::FxHashMap;
use tokio::task::{Id, JoinSet};
use tracing::instrument;

use crate::{
    bbox::BoundingBox,
    overpass::{FetchError, PoiSource},
    types::{PoiDataSet, PoiRecord, PoiType, PoiTypes, purge_unnamed},
};

type FetchResult = Result<Vec<PoiRecord>, FetchError>;

pub struct PoiAggregator<S> {
    source: Arc<S>,
    poi_types: PoiTypes,
    timeout: Duration,
}

impl<S: PoiSource> PoiAggregator<S> {
    pub fn new(source: S, poi_types: PoiTypes, timeout: Duration) -> Self {
        Self {
            source: Arc::new(source),
            poi_types,
            timeout,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Starts one request per POI type and returns immediately.
    ///
    /// Must be called from within a tokio runtime. The requests make progress
    /// while the caller does other work; [`PendingAggregate::join`] waits for them.
    pub fn launch(&self, bbox: BoundingBox) -> PendingAggregate {
        let mut tasks = JoinSet::new();
        let mut types = FxHashMap::default();

        for poi_type in self.poi_types.iter() {
            let source = Arc::clone(&self.source);
            let timeout = self.timeout;
            let request_type = poi_type.clone();
            let handle = tasks.spawn(async move {
                log::debug!("Requesting {request_type} in {bbox}");
                match tokio::time::timeout(timeout, source.fetch(&request_type, &bbox)).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout),
                }
            });
            types.insert(handle.id(), poi_type);
        }

        log::info!("Launched {} POI requests", types.len());
        PendingAggregate { tasks, types }
    }
}

/// Requests launched by [`PoiAggregator::launch`] that have not been joined yet.
pub struct PendingAggregate {
    tasks: JoinSet<FetchResult>,
    types: FxHashMap<Id, PoiType>,
}

impl PendingAggregate {
    /// Number of requests still to be joined.
    pub fn request_count(&self) -> usize {
        self.types.len()
    }

    /// Waits until every request has settled, successfully or not.
    ///
    /// A failed request never cancels its siblings; its subtype is simply absent
    /// from the resulting data set.
    #[instrument(skip(self), fields(requests = self.types.len()))]
    pub async fn join(mut self) -> AggregateReport {
        let mut report = AggregateReport::default();

        while let Some(joined) = self.tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(err) => (err.id(), Err(FetchError::Task(err.to_string()))),
            };
            let Some(poi_type) = self.types.remove(&id) else {
                log::error!("Settled request {id} has no POI type");
                continue;
            };

            match result {
                Ok(records) => {
                    let records = purge_unnamed(records);
                    log::info!("Data on {} loaded: {} named POIs", poi_type, records.len());
                    report.data.insert(poi_type.subtype, records);
                }
                Err(err) => {
                    log::warn!("Unsuccessful request for {poi_type}: {err}");
                    report.failures.push((poi_type, err));
                }
            }
        }

        report
    }
}

/// Outcome of a joined aggregate.
#[derive(Debug, Default)]
pub struct AggregateReport {
    /// Purged records of every successful request, keyed by subtype.
    pub data: PoiDataSet,
    pub failures: Vec<(PoiType, FetchError)>,
}

impl AggregateReport {
    pub fn failed_types(&self) -> impl Iterator<Item = &PoiType> {
        self.failures.iter().map(|(poi_type, _)| poi_type)
    }
}
