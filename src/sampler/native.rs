//! Sampling with the server's native `$sample` aggregation stage.

use futures::{StreamExt, TryStreamExt};
use mongodb::bson::{Document, doc};

use crate::document::SampleItem;
use crate::error::Result;
use crate::options::SampleRequest;
use crate::sampler::reservoir_sampler::ReservoirSampler;
use crate::sampler::{SampleStream, Sampler, deferred};
use crate::store::{AggregateSettings, SampleStore};

/// Aggregation stages of a native sample, in execution order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    stages: Vec<Document>,
}

impl Pipeline {
    /// `$match` (if filtering), `$sample` (if the population exceeds the
    /// request), `$project` (if projecting). Projection runs last so it only
    /// touches the sampled documents.
    pub fn build(request: &SampleRequest, count: u64) -> Self {
        let mut stages = Vec::with_capacity(3);
        if !request.filter().is_empty() {
            stages.push(doc! { "$match": request.filter().clone() });
        }
        if count > request.size() {
            let size = request.size().min(count);
            stages.push(doc! { "$sample": { "size": i64::try_from(size).unwrap_or(i64::MAX) } });
        }
        if let Some(projection) = request.projection() {
            stages.push(doc! { "$project": projection.clone() });
        }
        Self { stages }
    }

    pub fn stages(&self) -> &[Document] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<Document> {
        self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn has_sample_stage(&self) -> bool {
        self.stages.iter().any(|stage| stage.contains_key("$sample"))
    }
}

/// What the native sampler does for a given population.
#[derive(Debug, Clone, PartialEq)]
pub enum NativePlan {
    /// Hand off to the reservoir strategy.
    Reservoir,
    Pipeline(Pipeline),
}

/// Choose between `$sample` and the reservoir for `count` matching documents.
///
/// `$sample` degrades to a blocking sort when it selects more than roughly 5%
/// of the input, so populations in `(size, ratio × size]` go to the reservoir.
pub fn plan(request: &SampleRequest, count: u64) -> NativePlan {
    let size = request.size();
    let cutoff = size.saturating_mul(request.thresholds().reservoir_ratio);
    if count > size && count <= cutoff {
        return NativePlan::Reservoir;
    }
    NativePlan::Pipeline(Pipeline::build(request, count))
}

/// Native `$sample` strategy with a reservoir fallback.
pub struct NativeSampler<S> {
    store: S,
    request: SampleRequest,
}

impl<S: SampleStore> NativeSampler<S> {
    pub fn new(store: S, request: SampleRequest) -> Self {
        Self { store, request }
    }

    pub fn request(&self) -> &SampleRequest {
        &self.request
    }

    async fn start(self) -> Result<SampleStream> {
        let Self { store, request } = self;

        let count = store
            .count(request.collection(), request.filter().clone(), request.max_time())
            .await?;
        log::debug!(
            "sampling {} documents from {} with {count} matching documents",
            request.size(),
            request.collection()
        );

        let pipeline = match plan(&request, count) {
            NativePlan::Reservoir => {
                let ratio = request.thresholds().reservoir_ratio;
                log::debug!("sample is over 1/{ratio} of the population, using reservoir");
                return Ok(ReservoirSampler::new(store, request).into_stream());
            }
            NativePlan::Pipeline(pipeline) => pipeline,
        };
        log::debug!("running native sample pipeline {:?}", pipeline.stages());

        let settings = AggregateSettings {
            allow_disk_use: true,
            max_time: request.max_time(),
            batch_size: Some(u32::try_from(request.size()).unwrap_or(u32::MAX)),
        };

        if request.raw() {
            let documents =
                store.aggregate_raw(request.collection(), pipeline.into_stages(), settings).await?;
            return Ok(documents.map_ok(SampleItem::Raw).boxed());
        }

        let promote = request.promote_values();
        let documents =
            store.aggregate(request.collection(), pipeline.into_stages(), settings).await?;
        Ok(documents.map_ok(move |doc| SampleItem::Document(doc).promoted(promote)).boxed())
    }
}

impl<S: SampleStore> Sampler for NativeSampler<S> {
    fn into_stream(self) -> SampleStream {
        deferred(self.start())
    }
}
