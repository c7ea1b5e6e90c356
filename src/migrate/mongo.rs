use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::ErrorKind;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use super::store::{ConnectionStore, IndexSpec};
use crate::config::StoreConfig;
use crate::error::AppError;

/// Server code for "ns does not exist".
const NAMESPACE_NOT_FOUND: i32 = 26;

pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect and ping; failing here is fatal for a repair run.
    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(AppError::from)?;
        let db = client.database(&config.database);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(AppError::from)?;
        tracing::info!("Connected to {}.{}", config.database, config.collection);
        Ok(Self {
            collection: db.collection(&config.collection),
        })
    }
}

fn is_namespace_missing(e: &mongodb::error::Error) -> bool {
    matches!(&*e.kind, ErrorKind::Command(c) if c.code == NAMESPACE_NOT_FOUND)
}

#[async_trait]
impl ConnectionStore for MongoStore {
    async fn list_indexes(&self) -> anyhow::Result<Vec<IndexSpec>> {
        let cursor = match self.collection.list_indexes().await {
            Ok(cursor) => cursor,
            Err(e) if is_namespace_missing(&e) => return Ok(Vec::new()),
            Err(e) => return Err(AppError::from(e).into()),
        };
        let models: Vec<IndexModel> = cursor.try_collect().await.map_err(AppError::from)?;

        Ok(models
            .into_iter()
            .map(|m| {
                let options = m.options.as_ref();
                IndexSpec {
                    name: options.and_then(|o| o.name.clone()).unwrap_or_default(),
                    keys: m.keys.keys().cloned().collect(),
                    unique: options.and_then(|o| o.unique).unwrap_or(false),
                }
            })
            .collect())
    }

    async fn drop_index(&self, name: &str) -> anyhow::Result<()> {
        self.collection
            .drop_index(name)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn create_unique_index(&self, name: &str, keys: &[&str]) -> anyhow::Result<()> {
        let mut key_doc = Document::new();
        for key in keys {
            key_doc.insert(*key, 1);
        }
        let model = IndexModel::builder()
            .keys(key_doc)
            .options(
                IndexOptions::builder()
                    .name(name.to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.collection
            .create_index(model)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn find_malformed(&self) -> anyhow::Result<Vec<Document>> {
        // `null` matches both null and missing fields.
        let filter = doc! { "$or": [ { "student": null }, { "alumni": null } ] };
        let cursor = self.collection.find(filter).await.map_err(AppError::from)?;
        Ok(cursor.try_collect().await.map_err(AppError::from)?)
    }

    async fn find_all(&self) -> anyhow::Result<Vec<Document>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(AppError::from)?;
        Ok(cursor.try_collect().await.map_err(AppError::from)?)
    }

    async fn set_pair(&self, id: &Bson, student: &Bson, alumni: &Bson) -> anyhow::Result<()> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.clone() },
                doc! { "$set": { "student": student.clone(), "alumni": alumni.clone() } },
            )
            .await
            .map_err(AppError::from)?;
        if result.matched_count == 0 {
            anyhow::bail!("no document with _id {id}");
        }
        Ok(())
    }

    async fn delete(&self, id: &Bson) -> anyhow::Result<()> {
        self.collection
            .delete_one(doc! { "_id": id.clone() })
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
