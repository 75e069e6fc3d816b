//! Sampling strategies and the selector that picks between them.
//!
//! This module provides:
//! - `capability`: detects whether the server has a native `$sample` stage
//! - `reservoir`: the Algorithm R container shared by every reservoir path
//! - `reservoir_sampler`: `_id` scan into a reservoir, then chunked lookups
//! - `native`: `$match`/`$sample`/`$project` pipelines with a reservoir fallback
//! - `selector`: the `sample` entry points

use std::future::Future;

use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt, future};

use crate::document::SampleItem;
use crate::error::Result;

pub mod capability;
pub mod native;
pub mod reservoir;
pub mod reservoir_sampler;
pub mod selector;

/// Lazily produced sample. Ends after the last document or after the first
/// error, never both.
pub type SampleStream = BoxStream<'static, Result<SampleItem>>;

/// A sampling strategy.
pub trait Sampler {
    /// Start sampling on first poll of the returned stream.
    fn into_stream(self) -> SampleStream;
}

/// A cold stream that runs `setup` when first polled and then forwards the
/// stream it produced. Stops after the first error.
pub(crate) fn deferred<F>(setup: F) -> SampleStream
where
    F: Future<Output = Result<SampleStream>> + Send + 'static,
{
    stream::once(setup)
        .try_flatten()
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}
