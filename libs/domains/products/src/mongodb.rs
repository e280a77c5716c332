//! MongoDB implementation of ProductStore

use async_trait::async_trait;
use core_config::{env_or_default, ConfigError, FromEnv};
use database::mongodb::{check_health, connect_from_config_with_retry, MongoConfig};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    options::ReturnDocument,
    Client, Collection,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{now_timestamp, Product, ProductInput, UpdateProduct};
use crate::repository::ProductStore;

pub const DEFAULT_COLLECTION: &str = "products";

/// Connection settings plus the collection holding products
#[derive(Clone, Debug)]
pub struct MongoStoreConfig {
    pub connection: MongoConfig,
    pub collection: String,
}

impl FromEnv for MongoStoreConfig {
    /// Reads the MongoDB connection variables plus MONGO_COLLECTION (default: `products`)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            connection: MongoConfig::from_env()?,
            collection: env_or_default("MONGO_COLLECTION", DEFAULT_COLLECTION),
        })
    }
}

/// Stored shape of a product; `_id` is an ObjectId assigned by the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    title: Option<String>,
    description: Option<String>,
    code: Option<i32>,
    photo_url: Option<String>,
    price: Option<i32>,
    timestamp: Option<String>,
    stock: Option<i32>,
}

impl ProductDocument {
    fn from_input(input: ProductInput) -> Self {
        Self {
            id: None,
            title: input.title,
            description: input.description,
            code: input.code,
            photo_url: input.photo_url,
            price: input.price,
            timestamp: Some(now_timestamp()),
            stock: input.stock,
        }
    }

    fn into_product(self, id: ObjectId) -> Product {
        Product {
            id: id.to_hex(),
            title: self.title,
            description: self.description,
            code: self.code,
            photo_url: self.photo_url,
            price: self.price,
            timestamp: self.timestamp,
            stock: self.stock,
        }
    }

    fn try_into_product(self) -> ProductResult<Product> {
        let id = self
            .id
            .ok_or_else(|| ProductError::Database("document without _id".to_string()))?;
        Ok(self.into_product(id))
    }
}

/// `$set` body holding only the fields present in `changes`
fn set_document(changes: &ProductInput) -> Document {
    let mut set = Document::new();

    if let Some(ref title) = changes.title {
        set.insert("title", title.clone());
    }
    if let Some(ref description) = changes.description {
        set.insert("description", description.clone());
    }
    if let Some(code) = changes.code {
        set.insert("code", code);
    }
    if let Some(ref photo_url) = changes.photo_url {
        set.insert("photoUrl", photo_url.clone());
    }
    if let Some(price) = changes.price {
        set.insert("price", price);
    }
    if let Some(stock) = changes.stock {
        set.insert("stock", stock);
    }

    set
}

/// Malformed ids cannot match any document, so they surface as not-found
fn object_id(id: &str) -> ProductResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| ProductError::NotFound(id.to_string()))
}

pub struct MongoProductStore {
    client: Client,
    collection: Collection<ProductDocument>,
}

impl MongoProductStore {
    pub fn new(client: Client, database: &str, collection: &str) -> Self {
        let collection = client.database(database).collection(collection);
        Self { client, collection }
    }

    /// Connect with retry and bind to the configured collection
    pub async fn connect(config: &MongoStoreConfig) -> ProductResult<Self> {
        let client = connect_from_config_with_retry(&config.connection, None).await?;
        Ok(Self::new(
            client,
            config.connection.database(),
            &config.collection,
        ))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    fn name(&self) -> &'static str {
        "mongo"
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> ProductResult<Vec<Product>> {
        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<ProductDocument> = cursor.try_collect().await?;

        documents
            .into_iter()
            .map(ProductDocument::try_into_product)
            .collect()
    }

    #[instrument(skip(self))]
    async fn list(&self, id: &str) -> ProductResult<Product> {
        let oid = object_id(id)?;

        self.collection
            .find_one(doc! { "_id": oid })
            .await?
            .map(|document| document.into_product(oid))
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, input))]
    async fn save(&self, input: ProductInput) -> ProductResult<Product> {
        let document = ProductDocument::from_input(input);
        let result = self.collection.insert_one(&document).await?;

        let oid = match result.inserted_id {
            Bson::ObjectId(oid) => oid,
            other => {
                return Err(ProductError::Database(format!(
                    "unexpected inserted id: {}",
                    other
                )))
            }
        };

        tracing::info!(product_id = %oid, "Product created successfully");
        Ok(document.into_product(oid))
    }

    #[instrument(skip(self, update), fields(product_id = %update.id))]
    async fn update(&self, update: UpdateProduct) -> ProductResult<Product> {
        let oid = object_id(&update.id)?;
        let set = set_document(&update.changes);

        if set.is_empty() {
            return self.list(&update.id).await;
        }

        self.collection
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .map(|document| document.into_product(oid))
            .ok_or(ProductError::NotFound(update.id))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> ProductResult<Product> {
        let oid = object_id(id)?;

        let removed = self
            .collection
            .find_one_and_delete(doc! { "_id": oid })
            .await?
            .map(|document| document.into_product(oid))
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        tracing::info!(product_id = %id, "Product deleted");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> ProductResult<Vec<Product>> {
        // Only the documents read here are deleted, so concurrent inserts survive.
        let removed = self.list_all().await?;
        let ids: Vec<ObjectId> = removed
            .iter()
            .filter_map(|p| ObjectId::parse_str(&p.id).ok())
            .collect();

        if !ids.is_empty() {
            let result = self
                .collection
                .delete_many(doc! { "_id": { "$in": ids } })
                .await?;
            tracing::info!(deleted = result.deleted_count, "Products deleted");
        }

        Ok(removed)
    }

    async fn health_check(&self) -> ProductResult<()> {
        Ok(check_health(&self.client).await?)
    }
}
