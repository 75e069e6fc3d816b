//! Strategy selection: the public `sample` entry points.

use mongodb::Database;

use crate::config::SamplingThresholds;
use crate::error::Result;
use crate::options::{SampleOptions, SampleRequest};
use crate::sampler::capability::supports_native_sample;
use crate::sampler::native::NativeSampler;
use crate::sampler::reservoir_sampler::ReservoirSampler;
use crate::sampler::{SampleStream, Sampler, deferred};
use crate::store::{MongoStore, SampleStore};

/// The strategy a sample runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Client-side reservoir over an `_id` scan.
    Reservoir,
    /// Server-side `$sample`, with its own reservoir fallback.
    Native,
}

/// Pick the strategy for `store` by probing its version.
pub async fn select_strategy<S: SampleStore>(
    store: &S,
    thresholds: &SamplingThresholds,
) -> Strategy {
    if supports_native_sample(store, &thresholds.min_native_version).await {
        Strategy::Native
    } else {
        Strategy::Reservoir
    }
}

/// Sample documents of `collection` with the default thresholds.
///
/// Invalid options are rejected here, before any I/O. The returned stream is
/// cold: the store is first touched when it is polled, and store failures
/// arrive as an `Err` item on it.
///
/// ```no_run
/// use collection_sample::{SampleOptions, sample_database};
/// use futures::TryStreamExt;
/// use mongodb::bson::doc;
///
/// # async fn run(db: mongodb::Database) -> collection_sample::Result<()> {
/// let options = SampleOptions { size: 10, query: doc! { "is_even": 1 }, ..Default::default() };
/// let docs: Vec<_> = sample_database(&db, "haystack", options)?.try_collect().await?;
/// assert!(docs.len() <= 10);
/// # Ok(())
/// # }
/// ```
pub fn sample<S: SampleStore>(
    store: S,
    collection: &str,
    options: SampleOptions,
) -> Result<SampleStream> {
    sample_with_thresholds(store, collection, options, SamplingThresholds::default())
}

/// Like [`sample`], with custom thresholds.
pub fn sample_with_thresholds<S: SampleStore>(
    store: S,
    collection: &str,
    options: SampleOptions,
    thresholds: SamplingThresholds,
) -> Result<SampleStream> {
    let request = SampleRequest::new(collection, options, thresholds)?;

    Ok(deferred(async move {
        let strategy = select_strategy(&store, request.thresholds()).await;
        log::debug!("sampling {} with the {strategy:?} strategy", request.collection());
        Ok(match strategy {
            Strategy::Reservoir => ReservoirSampler::new(store, request).into_stream(),
            Strategy::Native => NativeSampler::new(store, request).into_stream(),
        })
    }))
}

/// Sample `collection` of a driver database handle.
pub fn sample_database(
    database: &Database,
    collection: &str,
    options: SampleOptions,
) -> Result<SampleStream> {
    sample(MongoStore::new(database.clone()), collection, options)
}
