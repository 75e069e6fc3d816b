//! In-memory `SampleStore` for unit tests.
//!
//! Supports top-level equality filters, single-key sorts, inclusion
//! projections, and the `$match`/`$sample`/`$project` stages. Every call is
//! recorded so tests can assert on what reached the store.

use std::cmp::Ordering;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use mongodb::bson::{Bson, Document, RawDocumentBuf, doc};
use parking_lot::Mutex;

use crate::document::SampleItem;
use crate::error::{Error, Result};
use crate::sampler::reservoir::Reservoir;
use crate::store::{AggregateSettings, IdScan, LookupOptions, SampleStore};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoreCall {
    ServerVersion,
    Count { filter: Document },
    ScanIds { sort: Document, limit: i64 },
    Lookup { ids: Vec<Bson> },
    Aggregate { pipeline: Vec<Document>, settings: AggregateSettings, raw: bool },
}

#[derive(Default)]
struct State {
    version: Option<String>,
    documents: Vec<Document>,
    hidden: Vec<Bson>,
    fail_counts: bool,
    fail_scans: bool,
    calls: Vec<StoreCall>,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    state: Arc<Mutex<State>>,
}

/// `count` documents shaped like `{ _id: "needle_i", n, is_even, long, double, int }`.
pub(crate) fn haystack(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            doc! {
                "_id": format!("needle_{i}"),
                "n": i as i32,
                "is_even": (i % 2) as i32,
                "long": 1_234_567_890_i64,
                "double": 0.23456,
                "int": 1234_i32,
            }
        })
        .collect()
}

impl MemoryStore {
    pub(crate) fn with_version(version: &str) -> Self {
        let store = Self::default();
        store.state.lock().version = Some(version.to_string());
        store
    }

    /// A store whose version probe fails.
    pub(crate) fn without_version() -> Self {
        Self::default()
    }

    pub(crate) fn insert_many(&self, documents: Vec<Document>) {
        self.state.lock().documents.extend(documents);
    }

    /// Keep `id` visible to counts and scans but missing from lookups, as if
    /// it were deleted mid-sample.
    pub(crate) fn hide_on_lookup(&self, id: impl Into<Bson>) {
        self.state.lock().hidden.push(id.into());
    }

    pub(crate) fn fail_counts(&self) {
        self.state.lock().fail_counts = true;
    }

    pub(crate) fn fail_scans(&self) {
        self.state.lock().fail_scans = true;
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    fn record(&self, call: StoreCall) {
        self.state.lock().calls.push(call);
    }

    fn matching(&self, filter: &Document) -> Vec<Document> {
        self.state.lock().documents.iter().filter(|doc| matches(doc, filter)).cloned().collect()
    }

    fn run_pipeline(&self, pipeline: &[Document]) -> Result<Vec<Document>> {
        let mut documents = self.state.lock().documents.clone();
        for stage in pipeline {
            let (name, spec) = stage
                .iter()
                .next()
                .ok_or_else(|| Error::MalformedReply("empty pipeline stage".into()))?;
            let spec = spec
                .as_document()
                .ok_or_else(|| Error::MalformedReply(format!("{name} needs a document")))?;
            documents = match name.as_str() {
                "$match" => documents.into_iter().filter(|doc| matches(doc, spec)).collect(),
                "$sample" => {
                    let size =
                        spec.get_i64("size").map_err(|e| Error::MalformedReply(e.to_string()))?;
                    let mut reservoir = Reservoir::new(size as usize);
                    reservoir.extend(documents);
                    reservoir.into_items()
                }
                "$project" => documents.iter().map(|doc| project(doc, spec)).collect(),
                other => return Err(Error::MalformedReply(format!("unsupported stage {other}"))),
            };
        }
        Ok(documents)
    }
}

impl SampleStore for MemoryStore {
    async fn server_version(&self) -> Result<String> {
        self.record(StoreCall::ServerVersion);
        self.state.lock().version.clone().ok_or_else(|| {
            io::Error::new(io::ErrorKind::ConnectionRefused, "buildInfo unavailable").into()
        })
    }

    async fn count(
        &self,
        _collection: &str,
        filter: Document,
        _max_time: Option<Duration>,
    ) -> Result<u64> {
        self.record(StoreCall::Count { filter: filter.clone() });
        if self.state.lock().fail_counts {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "count failed").into());
        }
        Ok(self.matching(&filter).len() as u64)
    }

    async fn scan_ids(
        &self,
        _collection: &str,
        scan: IdScan,
    ) -> Result<BoxStream<'static, Result<Bson>>> {
        self.record(StoreCall::ScanIds { sort: scan.sort.clone(), limit: scan.limit });
        if self.state.lock().fail_scans {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "scan failed").into());
        }

        let mut documents = self.matching(&scan.filter);
        if let Some((key, direction)) = scan.sort.iter().next() {
            let descending = number(direction).is_some_and(|d| d < 0.0);
            documents.sort_by(|a, b| {
                let ordering = compare(a.get(key), b.get(key));
                if descending { ordering.reverse() } else { ordering }
            });
        }
        let ids: Vec<Result<Bson>> = documents
            .into_iter()
            .take(scan.limit as usize)
            .filter_map(|doc| doc.get("_id").cloned())
            .map(Ok)
            .collect();
        Ok(stream::iter(ids).boxed())
    }

    async fn lookup(
        &self,
        _collection: &str,
        ids: Vec<Bson>,
        options: LookupOptions,
    ) -> Result<BoxStream<'static, Result<SampleItem>>> {
        self.record(StoreCall::Lookup { ids: ids.clone() });

        let state = self.state.lock();
        let mut items = Vec::new();
        for doc in &state.documents {
            let Some(id) = doc.get("_id") else { continue };
            if !ids.contains(id) || state.hidden.contains(id) {
                continue;
            }
            let doc = match &options.projection {
                Some(projection) => project(doc, projection),
                None => doc.clone(),
            };
            let item = if options.raw {
                SampleItem::Raw(RawDocumentBuf::from_document(&doc)?)
            } else {
                SampleItem::Document(doc)
            };
            items.push(Ok(item));
        }
        Ok(stream::iter(items).boxed())
    }

    async fn aggregate(
        &self,
        _collection: &str,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> Result<BoxStream<'static, Result<Document>>> {
        self.record(StoreCall::Aggregate { pipeline: pipeline.clone(), settings, raw: false });
        let documents = self.run_pipeline(&pipeline)?;
        Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
    }

    async fn aggregate_raw(
        &self,
        _collection: &str,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> Result<BoxStream<'static, Result<RawDocumentBuf>>> {
        self.record(StoreCall::Aggregate { pipeline: pipeline.clone(), settings, raw: true });
        let documents = self
            .run_pipeline(&pipeline)?
            .iter()
            .map(|doc| RawDocumentBuf::from_document(doc).map_err(Error::from))
            .collect::<Vec<_>>();
        Ok(stream::iter(documents).boxed())
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| {
        doc.get(key).is_some_and(|actual| compare(Some(actual), Some(expected)) == Ordering::Equal)
    })
}

fn compare(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    match (left, right) {
        (Some(Bson::String(l)), Some(Bson::String(r))) => l.cmp(r),
        (Some(l), Some(r)) => match (number(l), number(r)) {
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            _ if l == r => Ordering::Equal,
            _ => Ordering::Less,
        },
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn project(doc: &Document, projection: &Document) -> Document {
    let included = |flag: &Bson| match flag {
        Bson::Boolean(b) => *b,
        other => number(other).is_none_or(|n| n != 0.0),
    };

    let mut projected = Document::new();
    if projection.get("_id").is_none_or(included)
        && let Some(id) = doc.get("_id")
    {
        projected.insert("_id", id.clone());
    }
    for (key, flag) in projection {
        if key != "_id"
            && included(flag)
            && let Some(value) = doc.get(key)
        {
            projected.insert(key.clone(), value.clone());
        }
    }
    projected
}
