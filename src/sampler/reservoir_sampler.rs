//! Reservoir sampling over an `_id` scan, resolved with chunked lookups.
//!
//! Used when the server has no `$sample` stage, or when `$sample` would fall
//! into its blocking-sort range. The scan is capped (10 000 ids by default),
//! so documents past the cap in scan order are never selected.

use std::sync::Arc;

use futures::stream;
use futures::{StreamExt, TryStreamExt};
use mongodb::bson::Bson;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::Result;
use crate::options::SampleRequest;
use crate::sampler::reservoir::Reservoir;
use crate::sampler::{SampleStream, Sampler, deferred};
use crate::store::{IdScan, LookupOptions, SampleStore};

/// Client-side reservoir sampling strategy.
pub struct ReservoirSampler<S> {
    store: S,
    request: SampleRequest,
}

impl<S: SampleStore> ReservoirSampler<S> {
    pub fn new(store: S, request: SampleRequest) -> Self {
        Self { store, request }
    }

    pub fn request(&self) -> &SampleRequest {
        &self.request
    }

    /// Scan `_id`s into a reservoir of `size` and return the survivors.
    async fn fill_reservoir(&self) -> Result<Vec<Bson>> {
        // The thread RNG is not `Send`, so seed an owned one from it.
        let mut rng = StdRng::seed_from_u64(rand::random());
        self.fill_reservoir_with(&mut rng).await
    }

    async fn fill_reservoir_with(&self, rng: &mut StdRng) -> Result<Vec<Bson>> {
        let request = &self.request;
        let scan_limit = request.thresholds().scan_limit;
        // The scan never yields more than `scan_limit` ids.
        let capacity = request.size().min(scan_limit.unsigned_abs());
        let mut reservoir = Reservoir::new(usize::try_from(capacity).unwrap_or(usize::MAX));

        log::debug!(
            "scanning up to {scan_limit} ids of {} with {:?}",
            request.collection(),
            request.filter()
        );
        let scan = IdScan {
            filter: request.filter().clone(),
            sort: request.sort().clone(),
            limit: scan_limit,
            max_time: request.max_time(),
        };
        let mut ids = self.store.scan_ids(request.collection(), scan).await?;
        while let Some(id) = ids.try_next().await? {
            reservoir.offer_with_rng(id, rng);
        }

        log::debug!("reservoir kept {} of {} scanned ids", reservoir.len(), reservoir.seen());
        Ok(reservoir.into_items())
    }

    /// Resolve sampled ids to documents, `chunk_size` ids per lookup.
    fn resolve(self, ids: Vec<Bson>) -> SampleStream {
        let Self { store, request } = self;

        let chunks: Vec<Vec<Bson>> =
            ids.chunks(request.chunk_size()).map(<[Bson]>::to_vec).collect();
        log::debug!("resolving {} sampled ids in {} chunks", ids.len(), chunks.len());

        let collection: Arc<str> = Arc::from(request.collection());
        let options = LookupOptions {
            projection: request.projection().cloned(),
            max_time: request.max_time(),
            raw: request.raw(),
        };
        let promote = request.promote_values();
        let concurrency = request.thresholds().lookup_concurrency;

        // Each lookup cursor opens on first poll; at most `concurrency` are live.
        stream::iter(chunks)
            .map(move |chunk| {
                let store = store.clone();
                let collection = collection.clone();
                let options = options.clone();
                stream::once(async move { store.lookup(&collection, chunk, options).await })
                    .try_flatten()
                    .boxed()
            })
            .flatten_unordered(concurrency)
            .map_ok(move |item| item.promoted(promote))
            .boxed()
    }
}

impl<S: SampleStore> Sampler for ReservoirSampler<S> {
    fn into_stream(self) -> SampleStream {
        deferred(async move {
            let ids = self.fill_reservoir().await?;
            Ok(self.resolve(ids))
        })
    }
}
