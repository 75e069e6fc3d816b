//! Items emitted by a sample stream.

use mongodb::bson::{Bson, Document, RawDocumentBuf};

use crate::error::Result;

/// One sampled document, decoded or still encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleItem {
    Document(Document),
    /// A single self-contained BSON document.
    Raw(RawDocumentBuf),
}

impl SampleItem {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            SampleItem::Document(doc) => Some(doc),
            SampleItem::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&RawDocumentBuf> {
        match self {
            SampleItem::Raw(raw) => Some(raw),
            SampleItem::Document(_) => None,
        }
    }

    /// Decode into a [`Document`], parsing raw buffers if needed.
    pub fn into_document(self) -> Result<Document> {
        match self {
            SampleItem::Document(doc) => Ok(doc),
            SampleItem::Raw(raw) => Ok(raw.to_document()?),
        }
    }

    /// The `_id` of the sampled document, if it was projected.
    ///
    /// Raw buffers decode only the `_id` element; a malformed one is an error.
    pub fn id(&self) -> Result<Option<Bson>> {
        match self {
            SampleItem::Document(doc) => Ok(doc.get("_id").cloned()),
            SampleItem::Raw(raw) => match raw.get("_id")? {
                Some(id) => Ok(Some(Bson::try_from(id.to_raw_bson())?)),
                None => Ok(None),
            },
        }
    }

    pub(crate) fn promoted(self, promote: bool) -> Self {
        match self {
            SampleItem::Document(doc) if promote => SampleItem::Document(promote_numbers(doc)),
            other => other,
        }
    }
}

/// Widen every `Int32` in `doc` to `Int64`, recursing into nested documents
/// and arrays.
pub fn promote_numbers(doc: Document) -> Document {
    doc.into_iter().map(|(key, value)| (key, promote_value(value))).collect()
}

fn promote_value(value: Bson) -> Bson {
    match value {
        Bson::Int32(n) => Bson::Int64(i64::from(n)),
        Bson::Document(doc) => Bson::Document(promote_numbers(doc)),
        Bson::Array(values) => Bson::Array(values.into_iter().map(promote_value).collect()),
        other => other,
    }
}
