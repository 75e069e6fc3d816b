//! Caller-facing sample options and the validated request built from them.

use std::time::Duration;

use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

use crate::config::SamplingThresholds;
use crate::error::{Error, Result};

/// Options recognised by [`sample`](crate::sample).
///
/// Deserializes from the camelCase option objects used by MongoDB tooling,
/// e.g. `{ "query": { "is_even": 1 }, "size": 10, "maxTimeMS": 500 }`.
/// `filter` and `projection` are accepted as aliases for `query` and `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleOptions {
    /// Predicate restricting the sampled population. Empty matches everything.
    #[serde(default, alias = "filter")]
    pub query: Document,
    /// Upper bound on the number of documents returned.
    #[serde(default = "default_size")]
    pub size: u64,
    /// Projection applied to the sampled documents only.
    #[serde(default, alias = "projection")]
    pub fields: Option<Document>,
    /// Emit encoded BSON buffers instead of decoded documents.
    #[serde(default)]
    pub raw: bool,
    /// Scan order for the reservoir path.
    #[serde(default = "default_sort")]
    pub sort: Document,
    #[serde(default, rename = "maxTimeMS")]
    pub max_time_ms: Option<u64>,
    /// Widen 32-bit integers to 64-bit in decoded documents.
    #[serde(default = "default_true")]
    pub promote_values: bool,
    /// Number of `_id`s resolved per lookup on the reservoir path.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            query: Document::new(),
            size: default_size(),
            fields: None,
            raw: false,
            sort: default_sort(),
            max_time_ms: None,
            promote_values: true,
            chunk_size: default_chunk_size(),
        }
    }
}

impl SampleOptions {
    /// Decode options from a BSON document.
    pub fn from_document(options: &Document) -> Result<Self> {
        mongodb::bson::from_document(options.clone())
            .map_err(|e| Error::InvalidRequest(e.to_string()))
    }

    /// Decode options from a JSON object.
    pub fn from_json(options: &str) -> Result<Self> {
        serde_json::from_str(options).map_err(|e| Error::InvalidRequest(e.to_string()))
    }
}

fn default_size() -> u64 {
    5
}

fn default_sort() -> Document {
    doc! { "_id": -1 }
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    1000
}

/// A validated sampling request. Immutable once sampling starts.
#[derive(Debug, Clone)]
pub struct SampleRequest {
    collection: String,
    filter: Document,
    projection: Option<Document>,
    size: u64,
    sort: Document,
    max_time: Option<Duration>,
    raw: bool,
    chunk_size: usize,
    promote_values: bool,
    thresholds: SamplingThresholds,
}

impl SampleRequest {
    /// Validate `options` for `collection`. Fails before any store I/O.
    pub fn new(
        collection: &str,
        options: SampleOptions,
        thresholds: SamplingThresholds,
    ) -> Result<Self> {
        if collection.is_empty() {
            return Err(Error::InvalidRequest("collection name must not be empty".into()));
        }
        if options.size == 0 {
            return Err(Error::InvalidRequest("size must be at least 1".into()));
        }
        if i64::try_from(options.size).is_err() {
            return Err(Error::InvalidRequest(format!("size {} is out of range", options.size)));
        }
        if options.chunk_size == 0 {
            return Err(Error::InvalidRequest("chunkSize must be at least 1".into()));
        }
        thresholds.validate()?;

        // An empty projection selects nothing special; treat it like no projection.
        let projection = options.fields.filter(|fields| !fields.is_empty());

        Ok(Self {
            collection: collection.to_string(),
            filter: options.query,
            projection,
            size: options.size,
            sort: options.sort,
            max_time: options.max_time_ms.map(Duration::from_millis),
            raw: options.raw,
            chunk_size: options.chunk_size,
            promote_values: options.promote_values,
            thresholds,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filter(&self) -> &Document {
        &self.filter
    }

    pub fn projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sort(&self) -> &Document {
        &self.sort
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time
    }

    pub fn raw(&self) -> bool {
        self.raw
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn promote_values(&self) -> bool {
        self.promote_values
    }

    pub fn thresholds(&self) -> &SamplingThresholds {
        &self.thresholds
    }
}
