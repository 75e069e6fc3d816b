//! Representative random samples of MongoDB collections.
//!
//! [`sample`] probes the server, then either runs a native `$sample`
//! aggregation or falls back to client-side reservoir sampling over an `_id`
//! scan. Either way the result is a lazily produced [`SampleStream`].

pub mod config;
pub mod document;
pub mod error;
pub mod options;
pub mod sampler;
pub mod store;

pub use config::SamplingThresholds;
pub use document::SampleItem;
pub use error::{Error, Result};
pub use options::{SampleOptions, SampleRequest};
pub use sampler::capability::supports_native_sample;
pub use sampler::native::{NativePlan, NativeSampler, Pipeline, plan};
pub use sampler::reservoir::Reservoir;
pub use sampler::reservoir_sampler::ReservoirSampler;
pub use sampler::selector::{
    Strategy, sample, sample_database, sample_with_thresholds, select_strategy,
};
pub use sampler::{SampleStream, Sampler};
pub use store::{MongoStore, SampleStore};
