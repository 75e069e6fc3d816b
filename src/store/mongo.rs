//! `SampleStore` over the official MongoDB driver.

use std::time::Duration;

use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt, future};
use mongodb::bson::{Bson, Document, RawDocumentBuf, doc};
use mongodb::options::{AggregateOptions, CountOptions, FindOptions};
use mongodb::{Collection, Database};

use crate::document::SampleItem;
use crate::error::{Error, Result};
use crate::store::{AggregateSettings, IdScan, LookupOptions, SampleStore};

/// Samples collections of one MongoDB database.
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection::<T>(name)
    }
}

impl From<Database> for MongoStore {
    fn from(database: Database) -> Self {
        Self::new(database)
    }
}

impl SampleStore for MongoStore {
    async fn server_version(&self) -> Result<String> {
        let info = self.database.run_command(doc! { "buildInfo": 1 }).await?;
        info.get_str("version")
            .map(str::to_string)
            .map_err(|e| Error::MalformedReply(format!("buildInfo: {e}")))
    }

    async fn count(
        &self,
        collection: &str,
        filter: Document,
        max_time: Option<Duration>,
    ) -> Result<u64> {
        let mut options = CountOptions::default();
        options.max_time = max_time;

        let coll = self.collection::<Document>(collection);
        let count = coll.count_documents(filter).with_options(options).await?;
        Ok(count)
    }

    async fn scan_ids(
        &self,
        collection: &str,
        scan: IdScan,
    ) -> Result<BoxStream<'static, Result<Bson>>> {
        let mut options = FindOptions::default();
        options.projection = Some(doc! { "_id": 1 });
        options.sort = (!scan.sort.is_empty()).then_some(scan.sort);
        options.limit = Some(scan.limit);
        options.max_time = scan.max_time;

        let coll = self.collection::<Document>(collection);
        let cursor = coll.find(scan.filter).with_options(options).await?;
        Ok(cursor
            .map_err(Error::from)
            .try_filter_map(|doc| future::ready(Ok(doc.get("_id").cloned())))
            .boxed())
    }

    async fn lookup(
        &self,
        collection: &str,
        ids: Vec<Bson>,
        options: LookupOptions,
    ) -> Result<BoxStream<'static, Result<SampleItem>>> {
        let filter = doc! { "_id": { "$in": ids } };
        let mut find_options = FindOptions::default();
        find_options.projection = options.projection;
        find_options.max_time = options.max_time;

        if options.raw {
            let coll = self.collection::<RawDocumentBuf>(collection);
            let cursor = coll.find(filter).with_options(find_options).await?;
            Ok(cursor.map_ok(SampleItem::Raw).map_err(Error::from).boxed())
        } else {
            let coll = self.collection::<Document>(collection);
            let cursor = coll.find(filter).with_options(find_options).await?;
            Ok(cursor.map_ok(SampleItem::Document).map_err(Error::from).boxed())
        }
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> Result<BoxStream<'static, Result<Document>>> {
        let coll = self.collection::<Document>(collection);
        let cursor = coll.aggregate(pipeline).with_options(aggregate_options(settings)).await?;
        Ok(cursor.map_err(Error::from).boxed())
    }

    async fn aggregate_raw(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> Result<BoxStream<'static, Result<RawDocumentBuf>>> {
        // The driver cursor yields each stored document's bytes untouched.
        let coll = self.collection::<Document>(collection);
        let cursor = coll
            .aggregate(pipeline)
            .with_options(aggregate_options(settings))
            .with_type::<RawDocumentBuf>()
            .await?;
        Ok(cursor.map_err(Error::from).boxed())
    }
}

fn aggregate_options(settings: AggregateSettings) -> AggregateOptions {
    let mut options = AggregateOptions::default();
    options.allow_disk_use = Some(settings.allow_disk_use);
    options.max_time = settings.max_time;
    options.batch_size = settings.batch_size;
    options
}
