//! The backing-store operations consumed by the samplers.
//!
//! This module provides:
//! - `SampleStore`: the async driver surface the sampling strategies run on
//! - `MongoStore`: the implementation over a `mongodb::Database`
//! - option types passed through to the individual store calls

use std::future::Future;
use std::time::Duration;

use futures::stream::BoxStream;
use mongodb::bson::{Bson, Document, RawDocumentBuf};

use crate::document::SampleItem;
use crate::error::Result;

pub mod mongo;

#[cfg(test)]
pub(crate) mod memory;

pub use mongo::MongoStore;

/// Forward `_id` scan feeding the reservoir.
#[derive(Debug, Clone)]
pub struct IdScan {
    pub filter: Document,
    pub sort: Document,
    pub limit: i64,
    pub max_time: Option<Duration>,
}

/// Options for resolving a chunk of `_id`s to documents.
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    pub projection: Option<Document>,
    pub max_time: Option<Duration>,
    pub raw: bool,
}

/// Options for running an aggregation pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSettings {
    pub allow_disk_use: bool,
    pub max_time: Option<Duration>,
    pub batch_size: Option<u32>,
}

/// Async access to a document store.
///
/// Every returned stream is `'static` so it can outlive the borrow of the
/// store; implementations clone whatever handle they need.
pub trait SampleStore: Clone + Send + Sync + 'static {
    /// Version string reported by the server.
    fn server_version(&self) -> impl Future<Output = Result<String>> + Send;

    /// Number of documents matching `filter`.
    fn count(
        &self,
        collection: &str,
        filter: Document,
        max_time: Option<Duration>,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// `_id`s of the documents matched by `scan`, in scan order.
    fn scan_ids(
        &self,
        collection: &str,
        scan: IdScan,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bson>>>> + Send;

    /// Documents whose `_id` is one of `ids`. Missing ids are skipped.
    fn lookup(
        &self,
        collection: &str,
        ids: Vec<Bson>,
        options: LookupOptions,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<SampleItem>>>> + Send;

    /// Decoded results of `pipeline`.
    fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Document>>>> + Send;

    /// Results of `pipeline` as encoded documents, one buffer per document.
    fn aggregate_raw(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<RawDocumentBuf>>>> + Send;
}
